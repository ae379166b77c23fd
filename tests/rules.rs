use sigma_query::{rule_from_yaml, BackendConfig, QueryBackend};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const RULES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/rules");

fn backend() -> QueryBackend {
    QueryBackend::new(
        BackendConfig::default()
            .with_field_mapping([("EventID", "event_uid"), ("HiveName", "unmapped.HiveName")]),
    )
}

fn convert_file(path: &Path) -> Vec<String> {
    let yaml = fs::read_to_string(path).unwrap();
    let rule = rule_from_yaml(&yaml).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    backend()
        .convert_rule(&rule)
        .unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[test]
fn test_convert_all_rules() {
    let mut count = 0;
    for entry in WalkDir::new(RULES_DIR) {
        let entry = entry.unwrap();
        if entry.path().extension().and_then(|e| e.to_str()) != Some("yml") {
            continue;
        }

        let yaml = fs::read_to_string(entry.path()).unwrap();
        let rule = rule_from_yaml(&yaml).unwrap();
        let queries = convert_file(entry.path());

        assert_eq!(queries.len(), rule.conditions.len(), "{}", entry.path().display());
        assert!(queries.iter().all(|q| !q.is_empty()));
        count += 1;
    }
    assert!(count >= 6);
}

#[test]
fn test_network_connection_rule() {
    let queries = convert_file(&Path::new(RULES_DIR).join("network_connection_internal.yml"));
    assert_eq!(
        queries,
        vec![concat!(
            r#"(((DestinationIp: "10.0.0.0/8") OR (DestinationIp: "172.16.0.0/12") OR (DestinationIp: "192.168.0.0/16")) "#,
            r#"AND ("DestinationPort" "gte" 1024)) AND ((((NOT User: (NOT [* TO *]) AND _exists_: User) AND (_exists_: ParentImage))))"#
        )]
    );
}

#[test]
fn test_keyword_rule_with_multiple_conditions() {
    let queries = convert_file(&Path::new(RULES_DIR).join("keywords_multiple_conditions.yml"));
    assert_eq!(
        queries,
        vec![
            r#"(rm_ws_*bash_history) OR ("unset HISTFILE") OR ("history \-c")"#,
            "(event_uid: 4663) AND (unmapped.HiveName: *SAM*)",
        ]
    );
}

#[test]
fn test_encoded_powershell_rule() {
    let queries = convert_file(&Path::new(RULES_DIR).join("proc_creation_win_encoded_powershell.yml"));
    let query = &queries[0];

    assert!(query.starts_with(
        r#"((Image: *\\powershell.exe) OR (OriginalFileName: "PowerShell.EXE")) AND "#
    ));
    assert!(query.contains(r"(CommandLine: *_ws_\-enc_ws_*) OR (CommandLine: *_ws_\/enc_ws_*)"));
    assert!(query.contains("(CommandLine: *SUVY*)"));
    assert!(query.contains("(CommandLine: *QQBkAGQALQBNAHAAUAByAGUAZgBlAHIAZQBuAGMAZQ*)"));
}
