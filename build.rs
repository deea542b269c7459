fn main() {
    println!("cargo:rerun-if-changed=proto/icd.proto");
    prost_build::compile_protos(&["proto/icd.proto"], &["proto/"])
        .expect("failed to compile proto/icd.proto");
}
