use db::models::project::Project;
use serde::Serialize;
use serde_json::{Value, json};

/// Prompt payload sent to the hosted model as a single JSON string.
///
/// There is no function-calling mechanism on the other end: the
/// `instructions` prose and the `output` placeholder template are the only
/// things biasing the model toward the expected key set.
#[derive(Debug, Serialize)]
pub struct PromptPayload {
    pub prompt: Instructions,
    pub input: Value,
    pub output: Value,
}

#[derive(Debug, Serialize)]
pub struct Instructions {
    pub instructions: Vec<String>,
}

impl PromptPayload {
    pub fn to_prompt_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Build the feasibility-analysis prompt for a project.
pub fn analysis_prompt(project: &Project) -> PromptPayload {
    let instructions = [
        "You are an expert project analyst. Your response must be professional, well detailed, and thoroughly thought through.",
        "Review the provided project details including title, description, team size, start date, end date, country, and budget.",
        "Carefully assess the project's feasibility by evaluating its objectives, requirements, constraints, timeline, and team size.",
        "Provide a comprehensive and thoughtful analysis of the project's potential, clearly outlining any risks or challenges.",
        "If the project is feasible, produce a detailed plan that includes required resources, a clear timeline, and actionable steps.",
        "If the project is not feasible, clearly state the primary challenges and propose specific, actionable modifications to improve feasibility.",
        "Ensure that your response is structured, professional, and detailed in every aspect.",
        "Return only a valid JSON object that exactly follows this format:",
        "{\"detailed_description\": \"<Your detailed description>\", \"plan\": \"<Your step-by-step plan>\", \"analysis\": \"<Your feasibility analysis>\", \"feasibility_score\": <score between 1 and 10>}",
        "Do not include any additional text or commentary.",
    ];

    PromptPayload {
        prompt: Instructions {
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
        },
        input: json!({
            "title": project.title,
            "description": project.description,
            "team_size": project.team_size,
            "start_date": project.start_date.to_string(),
            "end_date": project.end_date.to_string(),
            "country": project.country,
            "budget": project.budget,
        }),
        output: json!({
            "detailed_description": "",
            "plan": "",
            "analysis": "",
            "feasibility_score": 0,
        }),
    }
}

/// Build the task-breakdown prompt for a project that passed the
/// feasibility gate.
pub fn task_breakdown_prompt(project: &Project) -> PromptPayload {
    let instructions = [
        "Provide a detailed project plan that includes:",
        "1. Role Assignment:",
        "   - Clearly define each team member's role.",
        "   - Specify their responsibilities relative to the project objectives.",
        "2. Task Breakdown:",
        "   - List all tasks required to complete the project.",
        "   - Assign each task to the appropriate team member.",
        "   - Include the estimated time each task should take, using ISO datetime format (YYYY-MM-DDTHH:MM:SS).",
        "3. Timeline and Milestones:",
        "   - Present a schedule outlining how tasks will be sequenced.",
        "   - Indicate key milestones and deadlines in ISO datetime format.",
        "4. Resource and Rate Planning:",
        "   - Include rate or cost estimates for each task if applicable.",
        "   - Ensure the plan remains within the provided budget and timeline.",
        "IMPORTANT: Output the assignments strictly in a valid JSON format. The JSON must either be a single object or an array of objects, and each object must include the following keys:",
        "         'team_member_number', 'task', 'start_date_time', 'end_date_time', and 'description'.",
        "         The datetime fields must be in the format 'YYYY-MM-DDTHH:MM:SS'.",
    ];

    PromptPayload {
        prompt: Instructions {
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
        },
        input: json!({
            "team_size": project.team_size,
            "detailed_description": project.description,
            "plan": "",
            "analysis": "",
            "feasibility_score": 0,
        }),
        output: json!({
            "team_member_number": 1,
            "task": "Task Name",
            "start_date_time": "YYYY-MM-DDTHH:MM:SS",
            "end_date_time": "YYYY-MM-DDTHH:MM:SS",
            "description": "Detailed description of the assigned task.",
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::project::Project;
    use uuid::Uuid;

    use super::*;

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: None,
            title: "Solar Farm".to_string(),
            description: "Build a 5MW solar farm".to_string(),
            team_size: 4,
            start_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            country: "Kenya".to_string(),
            budget: 250_000.0,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn analysis_prompt_serializes_project_fields() {
        let payload = analysis_prompt(&sample_project());
        let text = payload.to_prompt_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["input"]["title"], "Solar Farm");
        assert_eq!(value["input"]["team_size"], 4);
        // Dates go out as ISO-8601 calendar dates, budget as a float.
        assert_eq!(value["input"]["start_date"], "2026-03-01");
        assert_eq!(value["input"]["end_date"], "2026-09-30");
        assert_eq!(value["input"]["budget"], 250_000.0);
    }

    #[test]
    fn analysis_prompt_demands_json_only_output() {
        let payload = analysis_prompt(&sample_project());
        let joined = payload.prompt.instructions.join("\n");
        assert!(joined.contains("Return only a valid JSON object"));
        assert!(joined.contains("feasibility_score"));
        assert!(joined.contains("Do not include any additional text"));
    }

    #[test]
    fn task_prompt_shows_assignment_template() {
        let payload = task_breakdown_prompt(&sample_project());
        assert_eq!(payload.output["team_member_number"], 1);
        assert_eq!(payload.output["start_date_time"], "YYYY-MM-DDTHH:MM:SS");
        assert_eq!(payload.input["team_size"], 4);
        assert_eq!(payload.input["detailed_description"], "Build a 5MW solar farm");
    }
}
