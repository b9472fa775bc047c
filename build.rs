fn main() {
    // Expose git + build metadata to the crate through `built_info`.
    if let Err(err) = built::write_built_file() {
        panic!("Failed to acquire build-time information: {err}");
    }
}
