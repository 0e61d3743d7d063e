use super::*;

#[test]
fn option_level_escapes_quote_colon_and_backslash() {
    assert_eq!(escape_option_value("Age: 7"), r"Age\: 7");
    assert_eq!(escape_option_value("it's"), r"it\'s");
    assert_eq!(escape_option_value(r"a\b"), r"a\\b");
    assert_eq!(escape_option_value("plain"), "plain");
}

#[test]
fn graph_level_escapes_separators() {
    assert_eq!(escape_graph("a,b;c"), r"a\,b\;c");
    assert_eq!(escape_graph("[out]"), r"\[out\]");
    assert_eq!(escape_graph(r"x\:y"), r"x\\:y");
}

#[test]
fn two_levels_compose() {
    assert_eq!(escape_value("Age: 7"), r"Age\\: 7");
    assert_eq!(escape_value("O'Neil"), r"O\\\'Neil");
    assert_eq!(escape_value("if(lt(t,1),t,1)"), r"if(lt(t\,1)\,t\,1)");
    assert_eq!(
        escape_value("Ghost]; [0:v] drawtext=text=pwned"),
        r"Ghost\]\; \[0\\:v\] drawtext=text=pwned"
    );
}

#[test]
fn percent_is_left_alone() {
    // Expansion is switched off on drawtext instead.
    assert_eq!(escape_value("100%{pts}"), "100%{pts}");
}

#[test]
fn control_characters_are_rejected() {
    assert!(validate_user_text("Ghost").is_ok());
    assert!(validate_user_text("Gho\nst").is_err());
    assert!(validate_user_text("a\u{0}").is_err());
}
