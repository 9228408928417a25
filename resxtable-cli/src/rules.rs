use resxtable::RuleSet;

/// Print the code reference rules, in the order scanners apply them.
pub fn print_rules(rules: &RuleSet, json_output: bool) -> Result<(), String> {
    if json_output {
        let json = serde_json::to_string_pretty(rules)
            .map_err(|e| format!("Error serializing rules: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No code reference rules configured");
        return Ok(());
    }

    for (i, rule) in rules.iter().enumerate() {
        println!("\n=== Rule {} ===", i + 1);
        println!("Extensions: {}", rule.parsed_extensions().join(", "));
        println!("Expression: {}", rule.pattern());
        println!("Case sensitive: {}", rule.case_sensitive());
        if let Some(comment) = rule.line_comment() {
            println!("Line comment: {}", comment);
        }
    }
    Ok(())
}
