//! Lifecycle of a single simulation invocation. Every send starts a fresh
//! machine; nothing resumes a previous invocation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Building,
    Failed,
    Sent,
    Reconciled,
    TransportFailed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Failed | Phase::Reconciled | Phase::TransportFailed)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PhaseEvent {
    Build,
    HeadersRejected,
    Submit,
    Reply,
    TransportError,
}

#[derive(Debug, Clone)]
pub struct TransitionError {
    pub msg: String,
}

pub fn apply_event(phase: &mut Phase, event: PhaseEvent) -> Result<(Phase, Phase), TransitionError> {
    let prev = *phase;
    let next = match (prev, event) {
        (Phase::Idle, PhaseEvent::Build) => Phase::Building,
        (Phase::Building, PhaseEvent::HeadersRejected) => Phase::Failed,
        (Phase::Building, PhaseEvent::Submit) => Phase::Sent,
        (Phase::Sent, PhaseEvent::Reply) => Phase::Reconciled,
        (Phase::Sent, PhaseEvent::TransportError) => Phase::TransportFailed,
        (prev, event) => {
            return Err(TransitionError {
                msg: format!("invalid transition {:?} on {:?}", event, prev),
            })
        }
    };
    *phase = next;
    Ok((prev, next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let mut phase = Phase::Idle;
        apply_event(&mut phase, PhaseEvent::Build).unwrap();
        apply_event(&mut phase, PhaseEvent::Submit).unwrap();
        let (prev, next) = apply_event(&mut phase, PhaseEvent::Reply).unwrap();
        assert_eq!(prev, Phase::Sent);
        assert_eq!(next, Phase::Reconciled);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_parse_failure_is_terminal() {
        let mut phase = Phase::Idle;
        apply_event(&mut phase, PhaseEvent::Build).unwrap();
        apply_event(&mut phase, PhaseEvent::HeadersRejected).unwrap();
        assert_eq!(phase, Phase::Failed);
        assert!(phase.is_terminal());
        // Terminal: no further event is legal
        assert!(apply_event(&mut phase, PhaseEvent::Submit).is_err());
    }

    #[test]
    fn test_transport_failure_path() {
        let mut phase = Phase::Idle;
        apply_event(&mut phase, PhaseEvent::Build).unwrap();
        apply_event(&mut phase, PhaseEvent::Submit).unwrap();
        apply_event(&mut phase, PhaseEvent::TransportError).unwrap();
        assert_eq!(phase, Phase::TransportFailed);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_cannot_reply_before_send() {
        let mut phase = Phase::Idle;
        apply_event(&mut phase, PhaseEvent::Build).unwrap();
        let err = apply_event(&mut phase, PhaseEvent::Reply);
        assert!(err.is_err());
        assert_eq!(phase, Phase::Building);
    }

    #[test]
    fn test_cannot_build_twice() {
        let mut phase = Phase::Idle;
        apply_event(&mut phase, PhaseEvent::Build).unwrap();
        assert!(apply_event(&mut phase, PhaseEvent::Build).is_err());
    }
}
