use std::env::var;
use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &["proto/streaming.proto"];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";
    let out_dir = var("OUT_DIR").expect("Missing OUT_DIR environment variable");
    let descriptors_path = format!("{}/descriptors.bin", out_dir);

    // The client side is hand-written in `quadrpc-core` on top of `tonic::client::Grpc`,
    // so only the server trait and the messages are generated here.
    tonic_prost_build::configure()
        .file_descriptor_set_path(descriptors_path)
        .build_client(false)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
