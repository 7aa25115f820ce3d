//! Upstream request assembly from a session transcript.

use cg_domain::{Turn, TurnRole};

use crate::types::{Content, GenerateContentRequest};

/// Role name the upstream API expects for a transcript turn.
pub fn upstream_role(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "model",
    }
}

/// Build the upstream request: every prior turn in order, followed by the
/// new user turn.  Pure; the transcript is not touched.
pub fn build_request(history: &[Turn], new_user_text: &str) -> GenerateContentRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content::text(upstream_role(turn.role()), turn.text()))
        .collect();
    contents.push(Content::text(upstream_role(TurnRole::User), new_user_text));
    GenerateContentRequest { contents }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_single_user_turn() {
        let req = build_request(&[], "Hi");
        assert_eq!(req.contents, vec![Content::text("user", "Hi")]);
    }

    #[test]
    fn history_precedes_new_turn_in_order() {
        let history = vec![
            Turn::user("q1"),
            Turn::assistant("a1"),
            Turn::user("q2"),
            Turn::assistant("a2"),
        ];
        let req = build_request(&history, "q3");
        let roles: Vec<&str> = req.contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, ["user", "model", "user", "model", "user"]);
        let texts: Vec<String> = req
            .contents
            .iter()
            .filter_map(Content::joined_text)
            .collect();
        assert_eq!(texts, ["q1", "a1", "q2", "a2", "q3"]);
    }

    #[test]
    fn assistant_turns_use_model_role() {
        assert_eq!(upstream_role(TurnRole::Assistant), "model");
        assert_eq!(upstream_role(TurnRole::User), "user");
    }
}
