use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic::codec::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::grpc::proto::{}", input))
        .output_type(format!("crate::grpc::proto::{}", output))
        .codec_path(CODEC)
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    // Messages are declared by hand in src/grpc/proto.rs, so only the
    // service stubs are generated here and no protoc is needed.
    let leaky_bucket = Service::builder()
        .name("LeakyBucket")
        .package("drip.v1")
        .comment("Per-identity leaky bucket admission control.")
        .method(unary("configure", "Configure", "ConfigureRequest", "ConfigureResponse"))
        .method(unary("admit", "Admit", "AdmitRequest", "AdmitResponse"))
        .method(unary("get_bucket", "GetBucket", "GetBucketRequest", "GetBucketResponse"))
        .method(unary(
            "project_bucket",
            "ProjectBucket",
            "ProjectBucketRequest",
            "ProjectBucketResponse",
        ))
        .method(unary("evict_idle", "EvictIdle", "EvictIdleRequest", "EvictIdleResponse"))
        .build();

    Builder::new()
        .build_server(true)
        .build_client(true)
        .compile(&[leaky_bucket]);

    Ok(())
}
