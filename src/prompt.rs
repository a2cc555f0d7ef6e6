use serde::Deserialize;

/// Generation temperature and output bound used for every playbook.
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 22_000;

/// Validated trip preferences from the client form. Field names follow the
/// wire format (`workSituation`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookRequest {
    pub destination: String,
    pub duration: String,
    pub budget: String,
    pub work_situation: String,
    pub interests: Vec<String>,
}

/// Single generation request handed to the provider adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPayload {
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Required playbook sections, in order, with their brevity hints. Fixed
/// template, not user-configurable.
const SECTIONS: [(&str, &str); 12] = [
    (
        "Overview",
        "Brief intro to the destination and why it's great for digital nomads",
    ),
    (
        "Pre-Departure Checklist",
        "Personalized checklist based on duration and work situation - style this as an actual markdown checklist",
    ),
    (
        "Visa & Legal Requirements",
        "Entry requirements, visa options, stay duration limits - keep this brief",
    ),
    (
        "Budget Breakdown",
        "Overview of monthly costs (accommodation, food, coworking, transport, entertainment) for their budget tier",
    ),
    (
        "Accommodation Recommendations",
        "Specific neighborhoods and types of housing",
    ),
    (
        "Work Setup",
        "Best coworking spaces, cafes with wifi, time zone considerations - keep this very brief",
    ),
    (
        "Language Basics",
        "30-35 essential phrases with pronunciation guides",
    ),
    (
        "Cultural Preparation",
        "2 book recommendations, 1-2 movies/shows, key customs and etiquette",
    ),
    (
        "Transportation Guide",
        "Apps, metro/bus info, getting around, bike rentals - bullet points only",
    ),
    (
        "Neighborhood Guide",
        "Best areas to live, eat, and explore based on their interests - keep this brief",
    ),
    (
        "Essential Resources",
        "Embassy info, hospitals, pharmacies, emergency contacts, and specific safety tips, health precautions, insurance recommendations",
    ),
    (
        "Sample Itinerary",
        "First 2 days breakdown and weekly rhythm suggestions - keep this very high brief",
    ),
];

/// Build the generation payload for a validated request. The free-text
/// fields are interpolated verbatim; no sanitization happens here.
pub fn build(request: &PlaybookRequest) -> GenerationPayload {
    let mut prompt = format!(
        "You are an expert travel advisor specializing in digital nomad trips. \
         Create comprehensive, actionable trip playbooks that combine logistics, \
         cultural immersion, and practical advice.\n\n\
         Create a comprehensive trip playbook for a digital nomad planning to visit \
         {} for {}.\n\n\
         **User Profile:**\n\
         - Budget: {}\n\
         - Work situation: {}\n\
         - Interests: {}\n\n\
         **Required Sections:**\n",
        request.destination,
        request.duration,
        request.budget,
        request.work_situation,
        request.interests.join(", "),
    );

    for (index, (title, hint)) in SECTIONS.iter().enumerate() {
        prompt.push_str(&format!("{}. **{}** - {}\n", index + 1, title, hint));
    }

    prompt.push_str(
        "\nMake it specific, actionable, and tailored to their interests. Include \
         actual place names, specific neighborhoods, and real recommendations. \
         Format in clean Markdown with headers, bullet points, and bold text for \
         emphasis.",
    );

    GenerationPayload {
        prompt,
        temperature: TEMPERATURE,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lisbon_request() -> PlaybookRequest {
        PlaybookRequest {
            destination: "Lisbon, Portugal".to_string(),
            duration: "4 weeks".to_string(),
            budget: "mid-range".to_string(),
            work_situation: "full-time remote".to_string(),
            interests: vec!["food".to_string(), "coworking".to_string()],
        }
    }

    #[test]
    fn test_prompt_embeds_all_inputs_verbatim() {
        let payload = build(&lisbon_request());
        assert!(payload.prompt.contains("Lisbon, Portugal"));
        assert!(payload.prompt.contains("4 weeks"));
        assert!(payload.prompt.contains("Budget: mid-range"));
        assert!(payload.prompt.contains("Work situation: full-time remote"));
        assert!(payload.prompt.contains("Interests: food, coworking"));
    }

    #[test]
    fn test_prompt_contains_all_twelve_sections() {
        let payload = build(&lisbon_request());
        for (index, (title, _)) in SECTIONS.iter().enumerate() {
            let heading = format!("{}. **{}**", index + 1, title);
            assert!(
                payload.prompt.contains(&heading),
                "missing section heading: {}",
                heading
            );
        }
    }

    #[test]
    fn test_generation_parameters() {
        let payload = build(&lisbon_request());
        assert_eq!(payload.temperature, 0.7);
        assert_eq!(payload.max_output_tokens, 22_000);
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: PlaybookRequest = serde_json::from_value(serde_json::json!({
            "destination": "Tbilisi, Georgia",
            "duration": "2 months",
            "budget": "budget",
            "workSituation": "freelance",
            "interests": ["hiking"]
        }))
        .unwrap();
        assert_eq!(request.work_situation, "freelance");
    }
}
