use std::fs;
use std::path::Path;

// Validate the compute shader with naga so a WGSL regression fails in CI
// instead of at first GPU dispatch.
fn validate_wgsl_shader(shader_path_str: &str) {
    let shader_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(shader_path_str);
    let shader_source = match fs::read_to_string(&shader_path) {
        Ok(source) => source,
        Err(error) => panic!("Failed to read shader file {shader_path:?}: {error}"),
    };

    let module = match naga::front::wgsl::parse_str(&shader_source) {
        Ok(module) => module,
        Err(error) => {
            panic!(
                "WGSL parsing error in {shader_path:?}:\n{error_report}",
                error_report = error.emit_to_string(&shader_source)
            );
        }
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    match validator.validate(&module) {
        Ok(_) => println!("Successfully parsed and validated {shader_path:?}"),
        Err(error) => {
            panic!(
                "WGSL validation error in {shader_path:?}:\n{error_report}",
                error_report = error.emit_to_string(&shader_source)
            );
        }
    }
}

#[test]
fn validate_march_shader_compiles() {
    validate_wgsl_shader("src/shaders/march.wgsl");
}

#[test]
fn march_shader_declares_the_expected_entry_point() {
    let shader_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/shaders/march.wgsl");
    let source = fs::read_to_string(shader_path).unwrap();
    assert!(source.contains("@compute @workgroup_size(8, 8, 1)"));
    assert!(source.contains("fn main("));
}
