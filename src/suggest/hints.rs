//! Setup hints - heuristic mocking advice derived from the uncovered code.

/// Scan a code snippet for dependency patterns and return setup hints.
///
/// The checks run in a fixed order and each contributes at most one hint,
/// so the output is deterministic for a given snippet.
pub fn setup_hints(code_snippet: &str) -> Vec<String> {
    let snippet = code_snippet.to_lowercase();
    let mut hints = Vec::new();

    if snippet.contains("request") || snippet.contains("http") {
        hints.push("Mock HTTP requests with responses or httpx".to_string());
    }
    if snippet.contains("open(") || snippet.contains("path") {
        hints.push("Mock file operations with tmp_path fixture".to_string());
    }
    if snippet.contains("await") || snippet.contains("async") {
        hints.push("Use @pytest.mark.asyncio decorator".to_string());
    }
    if snippet.contains("database") || snippet.contains("cursor") || snippet.contains("session") {
        hints.push("Mock database connections".to_string());
    }
    if snippet.contains("datetime") || snippet.contains("time.") {
        hints.push("Use freezegun or mock datetime.now()".to_string());
    }
    if snippet.contains("random") {
        hints.push("Seed random or mock random functions".to_string());
    }
    if snippet.contains("environ") || snippet.contains("getenv") {
        hints.push("Use monkeypatch.setenv() for env vars".to_string());
    }
    if snippet.contains("subprocess") || snippet.contains("popen") {
        hints.push("Mock subprocess calls".to_string());
    }
    if snippet.contains("socket") {
        hints.push("Mock socket connections".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_snippet_gets_http_hint() {
        let hints = setup_hints("response = requests.get(url)");
        assert!(hints.iter().any(|h| h.contains("HTTP")));
    }

    #[test]
    fn async_snippet_gets_asyncio_hint() {
        let hints = setup_hints("await some_async_call()");
        assert!(hints.iter().any(|h| h.contains("asyncio")));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let hints = setup_hints("RESPONSE = REQUESTS.GET(URL)");
        assert!(hints.iter().any(|h| h.contains("HTTP")));
    }

    #[test]
    fn repeated_trigger_adds_one_hint() {
        let hints = setup_hints("requests.get(a); requests.get(b); http_call()");
        assert_eq!(
            hints
                .iter()
                .filter(|h| h.contains("HTTP"))
                .count(),
            1
        );
    }

    #[test]
    fn multiple_triggers_accumulate_in_check_order() {
        let hints = setup_hints("data = subprocess.run(cmd); sock = socket.socket()");
        assert_eq!(
            hints,
            vec![
                "Mock subprocess calls".to_string(),
                "Mock socket connections".to_string()
            ]
        );
    }

    #[test]
    fn plain_snippet_has_no_hints() {
        assert!(setup_hints("return a + b").is_empty());
    }
}
