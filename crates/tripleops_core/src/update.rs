use crate::{Effect, Msg, OutcomeKind, ProtocolViolation, RunPhase, SurfaceState};

const MISSING_ERROR_TEXT: &str = "operation failed without an error message";

/// Pure update function: applies a message to the surface state and returns
/// the effects the consumer must perform, in order.
pub fn update(mut state: SurfaceState, msg: Msg) -> (SurfaceState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started {
            kind,
            cancel_enabled,
        } => {
            if state.phase() != RunPhase::Configured {
                return (state, vec![Effect::Fault(ProtocolViolation::AlreadyStarted)]);
            }
            state.start(kind, cancel_enabled);
            vec![Effect::Open {
                title: kind.title(),
                cancellable: cancel_enabled,
            }]
        }
        Msg::Progress(event) => match state.phase() {
            RunPhase::Configured => vec![Effect::Fault(ProtocolViolation::NotStarted)],
            phase if phase.is_terminal() => {
                vec![Effect::Fault(ProtocolViolation::ProgressAfterTerminal)]
            }
            _ => {
                let label = event.label.clone();
                let (percentage_changed, label_changed) =
                    state.apply_progress(event.percentage, event.label);
                let mut effects = Vec::with_capacity(2);
                if percentage_changed {
                    effects.push(Effect::SetProgress(state.percentage()));
                }
                if label_changed {
                    effects.push(Effect::SetLabel(label));
                }
                effects
            }
        },
        Msg::CancelClicked => {
            // Without an enabled affordance the click is inert; the run
            // continues to natural completion.
            if state.phase() == RunPhase::Running
                && state.cancel_enabled()
                && !state.cancel_requested()
            {
                state.mark_cancel_requested();
                vec![Effect::RequestCancel]
            } else {
                Vec::new()
            }
        }
        Msg::Finished { outcome, error } => match state.phase() {
            RunPhase::Configured => vec![Effect::Fault(ProtocolViolation::NotStarted)],
            phase if phase.is_terminal() => {
                vec![Effect::Fault(ProtocolViolation::DuplicateTerminal)]
            }
            _ => finish(&mut state, outcome, error),
        },
    };

    (state, effects)
}

fn finish(state: &mut SurfaceState, outcome: OutcomeKind, error: Option<String>) -> Vec<Effect> {
    let code = outcome.result_code();
    match outcome {
        OutcomeKind::Failed => {
            let message = error
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| MISSING_ERROR_TEXT.to_string());
            state.finish(outcome, Some(message.clone()));
            vec![Effect::Close(code), Effect::ShowError(message)]
        }
        OutcomeKind::Succeeded | OutcomeKind::Cancelled => {
            state.finish(outcome, None);
            vec![Effect::Close(code)]
        }
    }
}
