//! Integration tests running the whole generator over declaration trees on
//! disk.

use std::fs;
use std::path::Path;

use bridgegen_core::validate::ValidationState;
use bridgegen_core::{
    BridgegenConfig, DiagnosticKind, GenerateOptions, Pipeline, TierStatus, ValidationOptions,
};
use tempfile::TempDir;

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, src) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, src).unwrap();
    }
    dir
}

fn offline() -> ValidationOptions {
    ValidationOptions {
        skip_compile: true,
        skip_typecheck: true,
        require_tools: None,
    }
}

fn generate(input: &Path, output: &Path) -> bridgegen_core::GenerateOutcome {
    let config = BridgegenConfig::default();
    Pipeline::new(&config)
        .generate(&GenerateOptions {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            validation: offline(),
            ..GenerateOptions::default()
        })
        .unwrap()
}

const ADS_DTS: &str = r#"
export interface AdEvent {
    type: 'loaded' | 'clicked';
}

/**
 * Loads an ad and streams its lifecycle.
 * @param args.adUnitId unit to load
 */
export declare function loadAdMobInterstitialAd(args: {
    options: { adUnitId: string };
    onEvent: (event: AdEvent) => void;
    onError: (error: Error) => void;
    onLoaded?: () => void;
    onDismissed?: () => void;
    onFailedToShow?: (reason: { code: number }) => void;
}): () => void;
"#;

const EVENTS_DTS: &str = r#"
export declare const graniteEvent: {
    addEventListener<K extends 'backEvent' | 'homeEvent' | 'visibilityChange'>(
        event: K,
        handler: { onEvent: (data?: { visible: boolean }) => void; onError?: (error: Error) => void }
    ): () => void;
};
"#;

const STORAGE_DTS: &str = r#"
export declare const Storage: {
    getItem(key: string): Promise<string | null>;
    setItem(key: string, value: string): Promise<void>;
    removeItem(key: string): Promise<void>;
};
"#;

const NETWORK_DTS: &str = r#"
export type NetworkStatus = 'OFFLINE' | 'WIFI' | '2G' | '3G' | '4G' | '5G' | 'WWAN' | 'UNKNOWN';

export declare function getNetworkStatus(): Promise<NetworkStatus>;
"#;

#[test]
fn namespace_object_round_trip() {
    let input = tree(&[(
        "widgets.d.ts",
        "export declare const fooNamespace: { foo: (x: number) => string; bar: () => Promise<boolean> };",
    )]);
    let config = BridgegenConfig::default();
    let analysis = Pipeline::new(&config).analyze(input.path()).unwrap();

    assert_eq!(analysis.apis.len(), 2);
    let foo = &analysis.apis[0];
    assert!(!foo.is_async);
    assert!(foo.return_type.is_primitive("string"));
    let bar = &analysis.apis[1];
    assert!(bar.is_async);
    assert!(bar.resolved_type().is_some_and(|t| t.is_primitive("boolean")));

    let grouped = analysis.grouped();
    assert_eq!(grouped.keys().collect::<Vec<_>>(), ["widgets"]);

    let out = tempfile::tempdir().unwrap();
    let outcome = generate(input.path(), out.path());
    assert!(out.path().join("AIT.Widgets.cs").is_file());
    assert!(out.path().join("AppsInToss-Widgets.jslib").is_file());
    assert!(outcome.succeeded());
}

#[test]
fn callback_registrations_match_named_callbacks() {
    let input = tree(&[("ads.d.ts", ADS_DTS)]);
    let out = tempfile::tempdir().unwrap();
    generate(input.path(), out.path());

    let js = fs::read_to_string(out.path().join("AppsInToss-Ads.jslib")).unwrap();
    for id in ["onLoadedId", "onDismissedId", "onFailedToShowId"] {
        assert!(js.contains(&format!("{id} = UTF8ToString({id});")), "{id}");
    }
    let cs = fs::read_to_string(out.path().join("AIT.Ads.cs")).unwrap();
    assert_eq!(cs.matches("AITCore.Instance.Unsubscribe(").count(), 4);
    assert!(!cs.contains("async Task"));
}

#[test]
fn event_channels_expand_per_event() {
    let input = tree(&[("events.d.ts", EVENTS_DTS)]);
    let config = BridgegenConfig::default();
    let analysis = Pipeline::new(&config).analyze(input.path()).unwrap();
    let names: Vec<_> = analysis.apis.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "graniteEventSubscribeBackEvent",
            "graniteEventSubscribeHomeEvent",
            "graniteEventSubscribeVisibilityChange",
        ]
    );
    assert!(analysis.apis.iter().all(|a| a.is_event_subscription && !a.is_async));
}

#[test]
fn literal_unions_become_enums() {
    let input = tree(&[("network.d.ts", NETWORK_DTS)]);
    let out = tempfile::tempdir().unwrap();
    generate(input.path(), out.path());

    let types = fs::read_to_string(out.path().join("AIT.Types.cs")).unwrap();
    assert!(types.contains("public enum NetworkStatus"));
    assert!(types.contains("[EnumMember(Value = \"2G\")]"));
    let cs = fs::read_to_string(out.path().join("AIT.Network.cs")).unwrap();
    assert!(cs.contains("Task<NetworkStatus> GetNetworkStatus()"));
}

#[test]
fn generation_is_deterministic() {
    let input = tree(&[
        ("ads.d.ts", ADS_DTS),
        ("events.d.ts", EVENTS_DTS),
        ("storage.d.ts", STORAGE_DTS),
        ("network.d.ts", NETWORK_DTS),
    ]);
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    generate(input.path(), first.path());
    generate(input.path(), second.path());

    let mut names: Vec<_> = fs::read_dir(first.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    names.sort();
    assert_eq!(names.len(), 4 * 2 + 6);
    for name in names {
        let a = fs::read(first.path().join(&name)).unwrap();
        let b = fs::read(second.path().join(&name)).unwrap();
        assert_eq!(a, b, "{name:?} differs between runs");
    }
}

#[test]
fn generated_code_passes_the_syntax_tier() {
    let input = tree(&[
        ("ads.d.ts", ADS_DTS),
        ("events.d.ts", EVENTS_DTS),
        ("storage.d.ts", STORAGE_DTS),
        ("network.d.ts", NETWORK_DTS),
    ]);
    let out = tempfile::tempdir().unwrap();
    let outcome = generate(input.path(), out.path());
    assert_eq!(outcome.report.syntax, TierStatus::Passed);
    assert_eq!(outcome.report.diagnostics.count(DiagnosticKind::SyntaxFatal), 0);
    assert_eq!(outcome.report.state, ValidationState::Passed);
}

#[test]
fn skip_files_and_companion_indexes_are_ignored() {
    let input = tree(&[
        ("types.d.ts", "export interface Shared { id: string }"),
        ("index.d.cts", "export declare function ghost(): void;"),
        ("index.d.ts", "export declare function notANamespace(): void;\nexport declare const Tools: { ping(): void };"),
        ("profile.d.ts", "import { Shared } from './types';\nexport declare function getProfile(): Promise<Shared>;"),
    ]);
    let config = BridgegenConfig::default();
    let analysis = Pipeline::new(&config).analyze(input.path()).unwrap();
    let names: Vec<_> = analysis.apis.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["ToolsPing", "getProfile"]);
    assert!(analysis.definitions.contains_key("Shared"));
}

#[test]
fn parse_errors_are_reported_and_skipped() {
    let input = tree(&[
        ("broken.d.ts", "export declare function (: ;"),
        ("device.d.ts", "export declare function getLocale(): string;"),
    ]);
    let config = BridgegenConfig::default();
    let analysis = Pipeline::new(&config).analyze(input.path()).unwrap();
    assert_eq!(analysis.apis.len(), 1);
    assert_eq!(analysis.diagnostics.count(DiagnosticKind::ParseError), 1);
}

#[test]
fn excluded_apis_are_left_out() {
    let input = tree(&[("storage.d.ts", STORAGE_DTS)]);
    let config = BridgegenConfig::parse("[input]\nexclude_apis = [\"Storage.removeItem\"]\n").unwrap();
    let analysis = Pipeline::new(&config).analyze(input.path()).unwrap();
    let names: Vec<_> = analysis.apis.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["StorageGetItem", "StorageSetItem"]);
}

#[test]
fn same_stem_declarations_render_into_one_category() {
    let input = tree(&[
        ("sdk/storage.d.ts", STORAGE_DTS),
        (
            "legacy/storage.d.ts",
            "export declare const Storage: {\n    clear(): Promise<void>;\n    getItem(key: string): string;\n};\n",
        ),
    ]);
    let output = tempfile::tempdir().unwrap();
    let outcome = generate(input.path(), output.path());

    assert_eq!(outcome.categories, ["storage"]);
    assert_eq!(outcome.api_count, 4);
    assert_eq!(outcome.diagnostics.count(DiagnosticKind::CategoryMerged), 1);
    assert_eq!(outcome.diagnostics.count(DiagnosticKind::DuplicateApi), 1);

    let cs = fs::read_to_string(output.path().join("AIT.Storage.cs")).unwrap();
    assert!(cs.contains("StorageClear"));
    assert!(cs.contains("StorageRemoveItem"));
    assert_eq!(cs.matches("static string StorageGetItem(").count(), 1);
    assert!(!output.path().join("AIT.Legacy.cs").exists());
}
