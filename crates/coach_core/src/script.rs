//! The fixed coaching script, canned greetings, and the completion marker.

use shared::error::FailureKind;

/// Literal token the model appends to the message carrying the final plan.
pub const COMPLETION_MARKER: &str = "[CURRICULUM_COMPLETE]";

pub const INSTRUCTION: &str = r#"
You are the "ALF - The Active Learning Framework Coach," an expert curriculum designer. Your goal is to help a teacher create a project-based learning (PBL) curriculum using this framework.

Your process is as follows:
1.  **Introduction:** Start with a detailed introduction.
    * Welcome the user to the "ALF - The Active Learning Framework Coach."
    * Explain the framework's purpose: It is a strategic guide for designing innovative educational opportunities relevant to the evolving needs of society and the future workforce, emphasizing critical thinking, problem-solving, and adaptability.
    * Give credit: Mention that the framework was developed by Kyle Branchesi, Amanda O'Keefe, and Nakeia Medcalf, and the AI component was developed by Kyle Branchesi.
    * Explain the process: State that you will guide them through the four stages (Catalyst, Issues, Method, Engagement) to build a complete curriculum plan.
    * End the intro by asking for the first piece of information for the Catalyst stage.

2.  **Guided Inquiry with Explanations:** For each of the four stages, you MUST first provide a brief explanation of that stage's purpose before asking for the first component. Then, ask for the other components of that stage ONE AT A TIME. Be conversational.
    * **Catalyst Stage:** First, explain its purpose (to spark curiosity and motivation by connecting learning to real-world issues). Then ask for the 'Big Idea', then the 'Essential Question', then 'The Challenge'.
    * **Issues Stage:** First, explain its purpose (to explore the underlying themes and societal challenges through research). Then ask for 'Guiding Questions', then the 'Comprehensive Research' plan, then ideas for 'Expert Perspectives', and finally 'Ethical Considerations'.
    * **Method Stage:** First, explain its purpose (to define tangible project outputs through collaboration and iteration). Then ask about 'Collaborative Projects', 'Iterative Prototyping', 'Use of Technology', and 'Practical Skills'.
    * **Engagement Stage:** First, explain its purpose (to connect student projects to the community for real-world feedback and impact). Then ask about 'Community Partnerships', 'Service Learning', 'Public Exhibitions', and 'Real-World Feedback'.

3.  **Confirmation:** After gathering all information for all four stages, ask if the user is ready for you to generate the full curriculum plan.

4.  **Curriculum Generation:** Once confirmed, generate a complete, well-structured curriculum plan in Markdown format, organized by stage.

5.  **Completion Signal:** At the VERY END of the message containing the final curriculum plan, you MUST include the special signal: [CURRICULUM_COMPLETE]. Do not add any text after this signal.
"#;

pub const WELCOME_GREETING: &str = "Welcome to the ALF - The Active Learning Framework Coach!\n\nThis framework is a strategic guide for designing innovative educational opportunities that are relevant to the evolving needs of society and the future workforce. It emphasizes critical thinking, problem-solving, and adaptability.\n\nThe Active Learning Framework was developed by **Kyle Branchesi, Amanda O'Keefe, and Nakeia Medcalf**. The AI component was developed by **Kyle Branchesi**.\n\nI will guide you through four stages to build a complete curriculum plan: Catalyst, Issues, Method, and Engagement.\n\nLet's begin with the **Catalyst** stage, which is designed to spark curiosity and motivation. What is the **'Big Idea'** or overarching theme for your project?";

pub const WELCOME_BACK_GREETING: &str = "Welcome back! Let's create a new curriculum plan.\n\nTo begin, what is the **'Big Idea'** for this new project?";

pub const CONNECTION_DIAGNOSTIC: &str = "Sorry, I encountered an error connecting to the AI. Please ensure your API key is set up correctly in your deployment environment.";
pub const SAFETY_DIAGNOSTIC: &str =
    "The response was blocked for safety reasons. Please rephrase your input.";
pub const NO_CONTENT_DIAGNOSTIC: &str = "Sorry, I couldn't generate a response.";

/// Sole termination signal for a session: exact, case-sensitive substring match.
pub fn contains_completion_marker(text: &str) -> bool {
    text.contains(COMPLETION_MARKER)
}

/// Removes the marker and surrounding whitespace. `None` when nothing is left.
pub fn extract_final_document(text: &str) -> Option<String> {
    let document = text.replacen(COMPLETION_MARKER, "", 1);
    let document = document.trim();
    (!document.is_empty()).then(|| document.to_string())
}

/// Drops every marker occurrence from text that must not end a session.
pub fn strip_completion_marker(text: &str) -> String {
    text.replace(COMPLETION_MARKER, "")
}

pub fn diagnostic_text(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Connection => CONNECTION_DIAGNOSTIC,
        FailureKind::SafetyBlock => SAFETY_DIAGNOSTIC,
        FailureKind::NoContent => NO_CONTENT_DIAGNOSTIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_match_is_exact_and_case_sensitive() {
        assert!(contains_completion_marker("Plan text. [CURRICULUM_COMPLETE]"));
        assert!(!contains_completion_marker("Plan text. [curriculum_complete]"));
        assert!(!contains_completion_marker("Plan text. [CURRICULUM_COMPLETE"));
        assert!(!contains_completion_marker("CURRICULUM_COMPLETE"));
    }

    #[test]
    fn extracts_document_around_marker() {
        assert_eq!(
            extract_final_document("Plan text. [CURRICULUM_COMPLETE]").as_deref(),
            Some("Plan text.")
        );
        assert_eq!(
            extract_final_document("\n# Plan\n\nBody\n[CURRICULUM_COMPLETE]\n  ").as_deref(),
            Some("# Plan\n\nBody")
        );
    }

    #[test]
    fn marker_alone_yields_no_document() {
        assert_eq!(extract_final_document("  [CURRICULUM_COMPLETE] \n"), None);
    }

    #[test]
    fn stripping_removes_every_marker() {
        assert_eq!(
            strip_completion_marker("a [CURRICULUM_COMPLETE] b [CURRICULUM_COMPLETE]"),
            "a  b "
        );
        assert_eq!(strip_completion_marker("[curriculum_complete]"), "[curriculum_complete]");
    }

    #[test]
    fn instruction_announces_the_marker() {
        assert!(contains_completion_marker(INSTRUCTION));
        assert!(!contains_completion_marker(WELCOME_GREETING));
        assert!(!contains_completion_marker(WELCOME_BACK_GREETING));
    }

    #[test]
    fn diagnostics_are_distinct() {
        let texts = [
            diagnostic_text(FailureKind::Connection),
            diagnostic_text(FailureKind::SafetyBlock),
            diagnostic_text(FailureKind::NoContent),
        ];
        assert_ne!(texts[0], texts[1]);
        assert_ne!(texts[1], texts[2]);
        assert_ne!(texts[0], texts[2]);
    }
}
