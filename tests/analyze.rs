//! End-to-end tests for the analysis pipeline, driving the engine over
//! in-memory projects and over real directories via the discovery layer.

use std::fs;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use varia::core::{
    Aggregator, AnalyzeOptions, FingerprintCache, HookNames, NoopCache, RecordingCache,
    SourceFile,
};
use varia::discovery::discover_files;
use varia::issues::{IssueExt, Rule};

fn files(sources: &[(&str, &str)]) -> Vec<SourceFile> {
    sources
        .iter()
        .map(|(path, text)| SourceFile::new(*path, *text))
        .collect()
}

#[test]
fn full_project_produces_ordered_manifest() {
    let project = files(&[
        (
            "src/App.tsx",
            r#"
            import { PREFIX } from "./constants";

            const DEFAULT_THEME = "dark";
            const SIZES = ["sm", "md", "lg"] as const;

            export function App() {
                const [theme, setTheme] = useUIState("theme", DEFAULT_THEME);
                const [size, setSize] = useScopedUIState("size", SIZES[1]);

                return (
                    <main className="theme-light:bg-white md:size-lg:p-4">
                        <button onClick={() => setTheme(theme === "dark" ? "light" : "dark")} />
                        <button onClick={() => setSize("sm")} />
                    </main>
                );
            }
            "#,
        ),
        (
            "src/Sidebar.tsx",
            r#"
            export function Sidebar() {
                const [state, setState] = useUIState("sidebar-state", "closed");
                return <aside className="sidebar-state-open:flex" onClick={() => setState("open")} />;
            }
            "#,
        ),
    ]);

    let outcome = Aggregator::with_default_cache().aggregate(&project, &AnalyzeOptions::default());

    assert!(!outcome.has_fatal_issues(), "issues: {:?}", outcome.issues);

    let keys: Vec<&str> = outcome
        .manifest
        .records
        .iter()
        .map(|r| r.key.as_str())
        .collect();
    assert_eq!(keys, vec!["theme", "size", "sidebar-state"]);

    let theme = outcome.manifest.record("theme").unwrap();
    assert_eq!(theme.initial_value.as_deref(), Some("dark"));
    // Scanned token first, then both arms of the setter conditional.
    assert_eq!(theme.values, vec!["light", "dark"]);

    let size = outcome.manifest.record("size").unwrap();
    assert_eq!(size.initial_value.as_deref(), Some("md"));
    assert_eq!(size.values, vec!["lg", "sm"]);

    let sidebar = outcome.manifest.record("sidebar-state").unwrap();
    assert_eq!(sidebar.initial_value.as_deref(), Some("closed"));
    assert_eq!(sidebar.values, vec!["open"]);

    assert_eq!(outcome.manifest.files, vec!["src/App.tsx", "src/Sidebar.tsx"]);
}

#[test]
fn longest_key_wins_across_declarations() {
    let project = files(&[(
        "app.tsx",
        r#"
        const [a, setA] = useUIState("theme", "base");
        const [b, setB] = useUIState("theme-test", "off");
        export const App = () => <div className="theme-test-dark:hidden" />;
        "#,
    )]);

    let outcome = Aggregator::with_default_cache().aggregate(&project, &AnalyzeOptions::default());

    assert_eq!(
        outcome.manifest.record("theme-test").unwrap().values,
        vec!["dark"]
    );
    assert!(outcome.manifest.record("theme").unwrap().values.is_empty());
}

#[test]
fn unresolvable_initial_value_aborts_only_its_file() {
    let project = files(&[
        (
            "bad.tsx",
            "import { importedConst } from './x';\nconst [v, setV] = useUIState('v', importedConst);",
        ),
        ("good.tsx", r#"const [t, setT] = useUIState("theme", "dark");"#),
    ]);

    let outcome = Aggregator::with_default_cache().aggregate(&project, &AnalyzeOptions::default());

    assert!(outcome.has_fatal_issues());
    let fatal = outcome
        .issues
        .iter()
        .find(|i| i.rule() == Rule::UnresolvableValue)
        .unwrap();
    assert_eq!(fatal.context().file_path, "bad.tsx");
    assert!(fatal.details().unwrap().contains("`importedConst`"));

    // The healthy file still produced its record.
    assert_eq!(outcome.manifest.records.len(), 1);
    assert_eq!(outcome.manifest.records[0].key, "theme");
}

#[test]
fn conflicting_initial_values_across_files() {
    let project = files(&[
        ("a.tsx", r#"const [t, setT] = useUIState("theme", "light");"#),
        ("b.tsx", r#"const [t, setT] = useUIState("theme", "dark");"#),
    ]);

    let outcome = Aggregator::with_default_cache().aggregate(&project, &AnalyzeOptions::default());

    let conflict = outcome
        .issues
        .iter()
        .find(|i| i.rule() == Rule::InitialValueConflict)
        .expect("conflict issue");
    assert_eq!(conflict.context().file_path, "a.tsx");
    assert!(conflict.message().contains("`theme`"));
    assert!(conflict.details().unwrap().contains("b.tsx"));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let project = files(&[(
        "app.tsx",
        r#"
        const [theme, setTheme] = useUIState("theme", "dark");
        export const App = () => (
            <div className="theme-light:flex" onClick={() => setTheme("oled")} />
        );
        "#,
    )]);
    let options = AnalyzeOptions::default();

    let warm = Aggregator::with_default_cache();
    let first = warm.aggregate(&project, &options);
    let second = warm.aggregate(&project, &options);
    let cold = Aggregator::new(Arc::new(NoopCache)).aggregate(&project, &options);

    assert_eq!(first, second);
    assert_eq!(first, cold);

    let json_first = varia::report::render_json(&first.manifest).unwrap();
    let json_second = varia::report::render_json(&second.manifest).unwrap();
    assert_eq!(json_first, json_second);
}

#[test]
fn scan_cache_is_shared_across_runs_and_keyed_by_content() {
    let cache = Arc::new(RecordingCache::new(FingerprintCache::new()));
    let aggregator = Aggregator::new(cache.clone());
    let options = AnalyzeOptions::default();

    let v1 = files(&[("app.tsx", r#"const [t, setT] = useUIState("theme", "dark");"#)]);
    aggregator.aggregate(&v1, &options);
    aggregator.aggregate(&v1, &options);
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 1);

    // Edited content re-scans; the old entry stays behind for undo cycles.
    let v2 = files(&[(
        "app.tsx",
        r#"const [t, setT] = useUIState("theme", "dark"); // edited"#,
    )]);
    aggregator.aggregate(&v2, &options);
    assert_eq!(cache.misses(), 2);

    aggregator.aggregate(&v1, &options);
    assert_eq!(cache.hits(), 2);
}

#[test]
fn custom_hook_names() {
    let project = files(&[(
        "app.tsx",
        r#"
        const [t, setT] = useAppState("theme", "dark");
        const [d, setD] = useUIState("density", "compact");
        "#,
    )]);
    let options = AnalyzeOptions {
        hooks: HookNames {
            global: "useAppState".to_string(),
            scoped: "useElementState".to_string(),
        },
        ..Default::default()
    };

    let outcome = Aggregator::with_default_cache().aggregate(&project, &options);

    // Only the configured hook is recognized.
    assert_eq!(outcome.manifest.records.len(), 1);
    assert_eq!(outcome.manifest.records[0].key, "theme");
}

#[test]
fn discovery_feeds_the_engine() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let src = root.join("src");
    fs::create_dir(&src).unwrap();
    fs::write(
        src.join("App.tsx"),
        r#"
        const [theme, setTheme] = useUIState("theme", "dark");
        export const App = () => <div className="theme-light:flex" />;
        "#,
    )
    .unwrap();
    fs::write(
        src.join("App.test.tsx"),
        r#"const [x, setX] = useUIState("only-in-tests", "y");"#,
    )
    .unwrap();

    let discovered = discover_files(root, &[], &[], true, false);
    assert_eq!(discovered.files.len(), 1);

    let outcome =
        Aggregator::with_default_cache().aggregate(&discovered.files, &AnalyzeOptions::default());

    assert!(!outcome.has_fatal_issues());
    assert_eq!(outcome.manifest.records.len(), 1);
    let record = &outcome.manifest.records[0];
    assert_eq!(record.key, "theme");
    assert_eq!(record.values, vec!["light"]);
    assert!(outcome.manifest.files[0].ends_with("App.tsx"));
}
