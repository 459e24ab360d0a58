//! Property tests: the artifact does not depend on input order.

use daedalus_config::GeneratorConfig;
use daedalus_gen::{Generator, SourceFile};
use proptest::prelude::*;

fn corpus() -> Vec<SourceFile> {
    vec![
        SourceFile::new("src/lib.rs", "pub mod api;\npub struct Item;\n"),
        SourceFile::new(
            "src/api/items.rs",
            "pub fn routes(app: &mut App) {\n    app.map_get(\"/items/{id}\", |id: u64| id);\n    app.map_post(\"/items\", |item: Json<Item>| item);\n}\n",
        ),
        SourceFile::new(
            "src/api/health.rs",
            "pub fn routes(app: &mut App) {\n    app.map_get(\"/health\", || \"ok\");\n    app.map_delete(\"/items/{id}\", |id: u64| StatusCode::NO_CONTENT);\n}\n",
        ),
        SourceFile::new(
            "src/api/search.rs",
            "pub fn routes(app: &mut App) {\n    app.map_get(\"/search\", |q: String, page: Option<u32>| q);\n    app.map_put(\"/items/{id}\", |id: u64, body: Opaque| id);\n}\n",
        ),
        SourceFile::new("src/api/mod.rs", "pub mod health;\npub mod items;\npub mod search;\n"),
    ]
}

fn generate(files: &[SourceFile]) -> (String, Vec<String>) {
    let output = Generator::new(GeneratorConfig::default()).unwrap().run(files).unwrap();
    let diagnostics = output.diagnostics.iter().map(ToString::to_string).collect();
    (output.artifact.text, diagnostics)
}

proptest! {
    /// Any permutation of the input files yields byte-identical output.
    #[test]
    fn prop_artifact_is_order_independent(order in Just((0..corpus().len()).collect::<Vec<_>>()).prop_shuffle()) {
        let files = corpus();
        let shuffled: Vec<SourceFile> = order.iter().map(|&i| files[i].clone()).collect();

        let (expected_text, expected_diagnostics) = generate(&files);
        let (text, diagnostics) = generate(&shuffled);

        prop_assert_eq!(text, expected_text);
        prop_assert_eq!(diagnostics, expected_diagnostics);
    }

    /// Thread count does not change the output.
    #[test]
    fn prop_artifact_is_thread_count_independent(threads in 1usize..4) {
        let files = corpus();
        let config = GeneratorConfig { threads, ..GeneratorConfig::default() };
        let output = Generator::new(config).unwrap().run(&files).unwrap();

        prop_assert_eq!(output.artifact.text, generate(&files).0);
    }
}

#[test]
fn test_cached_generator_matches_fresh_generator() {
    let files = corpus();
    let mut cached = Generator::new(GeneratorConfig::default()).unwrap();
    cached.run(&files).unwrap();
    let mut reversed = files.clone();
    reversed.reverse();

    let output = cached.run(&reversed).unwrap();

    assert_eq!(output.artifact.text, generate(&files).0);
}
