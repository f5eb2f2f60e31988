//! Exposes the path to the `boss-test-engine` cdylib to integration tests,
//! via the `CARGO_CDYLIB_FILE_BOSS_TEST_ENGINE` variable Cargo sets for a
//! dev-dependency with a `cdylib` target (the package name, dashes turned
//! to underscores and upper-cased).

fn main() {
    if let Ok(path) = std::env::var("CARGO_CDYLIB_FILE_BOSS_TEST_ENGINE") {
        println!("cargo:rustc-env=BOSS_TEST_ENGINE_PATH={path}");
    }
}
