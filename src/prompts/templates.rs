use crate::{
    lib::errors::RegistrationError,
    prompts::{list_arg, map_arg, text_arg, PromptArgs, PromptEntry, PromptRegistry},
    server::config::Settings,
    tools::base::ToolError,
};

pub fn register(
    registry: &mut PromptRegistry,
    _settings: &Settings,
) -> Result<usize, RegistrationError> {
    let entries = [
        PromptEntry::new("code-review", "Review a piece of code", code_review)
            .required("code", "The code to review")
            .optional("language", "Programming language (default: rust)")
            .optional("focus_areas", "Areas to focus on, e.g. performance, security"),
        PromptEntry::new("data-analysis", "Plan the analysis of a dataset", data_analysis)
            .required("data_description", "Description of the dataset")
            .required("analysis_goals", "Analysis objectives")
            .optional("data_format", "Format of the data (default: CSV)"),
        PromptEntry::new(
            "api-documentation",
            "Write documentation for an API endpoint",
            api_documentation,
        )
        .required("endpoint_name", "Path of the endpoint")
        .required("method", "HTTP method")
        .required("parameters", "Parameter names mapped to their descriptions")
        .required("description", "What the endpoint does"),
        PromptEntry::new("bug-report", "Turn an issue into a bug report", bug_report)
            .required("issue_description", "Brief description of the issue")
            .required("steps_to_reproduce", "Steps that reproduce the bug")
            .required("expected_behavior", "What should happen")
            .required("actual_behavior", "What actually happens")
            .optional("environment_info", "Environment details, e.g. OS and versions"),
        PromptEntry::new("feature-planning", "Plan a new feature", feature_planning)
            .required("feature_name", "Name of the feature")
            .required("feature_description", "Detailed description")
            .required("user_stories", "User stories")
            .optional("constraints", "Technical or business constraints"),
        PromptEntry::new("refactoring-guide", "Guide the refactoring of code", refactoring_guide)
            .required("code_snippet", "Code that needs refactoring")
            .required("current_issues", "Current problems with the code")
            .required("refactoring_goals", "Goals for the refactoring")
            .optional("language", "Programming language (default: rust)"),
    ];
    let count = entries.len();
    for entry in entries {
        registry.register(entry)?;
    }
    Ok(count)
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pairs(items: &[(String, String)]) -> String {
    items
        .iter()
        .map(|(key, value)| format!("- {key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_review(args: &PromptArgs) -> Result<String, ToolError> {
    let code = text_arg(args, "code", "")?;
    let language = text_arg(args, "language", "rust")?;
    let focus_areas = list_arg(args, "focus_areas")?;
    let focus = if focus_areas.is_empty() {
        String::new()
    } else {
        format!(
            "\nPlease pay special attention to: {}",
            focus_areas.join(", ")
        )
    };

    Ok(format!(
        "Please review the following {language} code and provide feedback:

```{language}
{code}
```

Review criteria:
- Code quality and readability
- Idiomatic use of the language
- Potential bugs or issues
- Performance considerations
- Security concerns
- Documentation quality{focus}

Please provide:
1. Overall assessment
2. Specific issues found
3. Suggestions for improvement
4. Positive aspects of the code
"
    ))
}

fn data_analysis(args: &PromptArgs) -> Result<String, ToolError> {
    let description = text_arg(args, "data_description", "")?;
    let goals = bullets(&list_arg(args, "analysis_goals")?);
    let format = text_arg(args, "data_format", "CSV")?;

    Ok(format!(
        "I have a {format} dataset with the following characteristics:

{description}

I want to perform the following analysis:
{goals}

Please provide:
1. A step-by-step analysis plan
2. Appropriate statistical methods to use
3. Code examples for the analysis
4. Visualization suggestions
5. Potential insights to look for
6. Common pitfalls to avoid

Focus on actionable insights and clear, interpretable results.
"
    ))
}

fn api_documentation(args: &PromptArgs) -> Result<String, ToolError> {
    let endpoint = text_arg(args, "endpoint_name", "")?;
    let method = text_arg(args, "method", "")?.to_uppercase();
    let parameters = pairs(&map_arg(args, "parameters")?);
    let description = text_arg(args, "description", "")?;

    Ok(format!(
        "Please create comprehensive API documentation for the following endpoint:

**Endpoint:** {method} {endpoint}
**Description:** {description}

**Parameters:**
{parameters}

Please include:
1. Complete endpoint description
2. Request/response examples
3. Parameter validation rules
4. Error response formats
5. Usage examples with curl
6. Rate limiting information (if applicable)
7. Authentication requirements (if any)

Format the documentation in a clear, developer-friendly manner with proper code examples.
"
    ))
}

fn bug_report(args: &PromptArgs) -> Result<String, ToolError> {
    let issue = text_arg(args, "issue_description", "")?;
    let steps = list_arg(args, "steps_to_reproduce")?
        .iter()
        .enumerate()
        .map(|(idx, step)| format!("{}. {step}", idx + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let expected = text_arg(args, "expected_behavior", "")?;
    let actual = text_arg(args, "actual_behavior", "")?;
    let environment = map_arg(args, "environment_info")?;
    let environment = if environment.is_empty() {
        String::new()
    } else {
        format!("\n**Environment:**\n{}", pairs(&environment))
    };

    Ok(format!(
        "Please help me create a comprehensive bug report for the following issue:

**Issue Description:**
{issue}

**Steps to Reproduce:**
{steps}

**Expected Behavior:**
{expected}

**Actual Behavior:**
{actual}{environment}

Please provide:
1. A well-structured bug report
2. Additional information that might be helpful
3. Potential root causes
4. Suggested debugging steps
5. Workarounds (if any)
6. Priority level assessment

Format this as a professional bug report suitable for a development team.
"
    ))
}

fn feature_planning(args: &PromptArgs) -> Result<String, ToolError> {
    let name = text_arg(args, "feature_name", "")?;
    let description = text_arg(args, "feature_description", "")?;
    let stories = bullets(&list_arg(args, "user_stories")?);
    let constraints = list_arg(args, "constraints")?;
    let constraints = if constraints.is_empty() {
        String::new()
    } else {
        format!("\n\n**Constraints:**\n{}", bullets(&constraints))
    };

    Ok(format!(
        "Please help me plan the following feature:

**Feature Name:** {name}

**Description:**
{description}

**User Stories:**
{stories}{constraints}

Please provide:
1. Detailed requirements analysis
2. Technical architecture suggestions
3. Implementation phases/milestones
4. Potential risks and mitigation strategies
5. Testing strategy
6. Success metrics
7. Timeline estimation approach

Focus on creating a comprehensive plan that addresses both technical and business aspects.
"
    ))
}

fn refactoring_guide(args: &PromptArgs) -> Result<String, ToolError> {
    let code = text_arg(args, "code_snippet", "")?;
    let issues = bullets(&list_arg(args, "current_issues")?);
    let goals = bullets(&list_arg(args, "refactoring_goals")?);
    let language = text_arg(args, "language", "rust")?;

    Ok(format!(
        "Please help me refactor the following {language} code:

```{language}
{code}
```

**Current Issues:**
{issues}

**Refactoring Goals:**
{goals}

Please provide:
1. Step-by-step refactoring plan
2. Refactored code with explanations
3. Design patterns that could be applied
4. Testing strategy for the refactored code
5. Performance implications
6. Backward compatibility considerations

Focus on clean, maintainable code that follows the conventions of the language.
"
    ))
}
