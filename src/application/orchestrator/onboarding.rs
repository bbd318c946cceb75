//! Onboarding: role, domain, then two optional answers.

use super::{Orchestrator, OrchestratorError, Step, Turn};
use crate::application::workers::ReplyKind;
use crate::domain::journey::{OnboardingStep, Phase};

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "start",
    "begin",
    "get started",
    "let's start",
    "lets start",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Blank messages and bare greetings open the conversation instead of
/// answering the role question.
pub(crate) fn is_greeting(message: &str) -> bool {
    let normalized = message
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    normalized.is_empty() || GREETINGS.contains(&normalized.as_str())
}

impl Orchestrator {
    pub(super) async fn onboarding(
        &self,
        turn: &mut Turn,
        input: Option<&str>,
    ) -> Result<Step, OrchestratorError> {
        let Some(message) = input else {
            turn.state.context.onboarding_step = OnboardingStep::Role;
            return Ok(Step::Reply(self.ask(OnboardingStep::Role)));
        };
        let answer = message.trim();

        match turn.state.context.onboarding_step {
            OnboardingStep::Role => {
                if is_greeting(answer) {
                    return Ok(Step::Reply(self.guide.render(&ReplyKind::Welcome)));
                }
                turn.state.target_role = Some(answer.to_string());
                turn.state.context.onboarding_step = OnboardingStep::Domain;
                Ok(Step::Reply(format!(
                    "Great, {} it is!\n\n{}",
                    answer,
                    self.ask(OnboardingStep::Domain)
                )))
            }
            OnboardingStep::Domain => {
                if answer.is_empty() {
                    return Ok(Step::Reply(self.ask(OnboardingStep::Domain)));
                }
                turn.state.target_domain = Some(answer.to_string());
                turn.state.context.onboarding_step = OnboardingStep::Background;
                Ok(Step::Reply(self.ask(OnboardingStep::Background)))
            }
            OnboardingStep::Background => {
                turn.state.background = self.optional_answer(answer);
                turn.state.context.onboarding_step = OnboardingStep::Interests;
                Ok(Step::Reply(self.ask(OnboardingStep::Interests)))
            }
            OnboardingStep::Interests => {
                turn.state.interests = self.optional_answer(answer);
                turn.state.context.onboarding_step = OnboardingStep::Done;
                self.finish_onboarding(turn)
            }
            OnboardingStep::Done => self.finish_onboarding(turn),
        }
    }

    fn finish_onboarding(&self, turn: &mut Turn) -> Result<Step, OrchestratorError> {
        if self.transition(turn, Phase::ProjectGeneration, "Onboarding completed") {
            return Ok(Step::Advance(self.ask(OnboardingStep::Done)));
        }
        // A required answer is missing; ask for it again.
        let step = if turn.state.target_role.is_none() {
            OnboardingStep::Role
        } else {
            OnboardingStep::Domain
        };
        turn.state.context.onboarding_step = step;
        Ok(Step::Reply(self.ask(step)))
    }

    fn optional_answer(&self, answer: &str) -> Option<String> {
        if answer.is_empty() || self.guide.is_skip(answer) {
            None
        } else {
            Some(answer.to_string())
        }
    }

    fn ask(&self, step: OnboardingStep) -> String {
        self.guide.render(&ReplyKind::OnboardingQuestion(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_are_recognized() {
        assert!(is_greeting(""));
        assert!(is_greeting("  Hello! "));
        assert!(is_greeting("hey"));
        assert!(!is_greeting("Data Analyst"));
        assert!(!is_greeting("hello world"));
    }
}
