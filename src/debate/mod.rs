mod engine;
mod parse;

pub use engine::{
    ApplyOutcome, ContentRequest, DebateEngine, DebateError, DebatePhase, DebateView, Exchange,
    ExchangeRole, OpponentLine, RequestKind, RequestTicket, Round, EMPTY_PLACEHOLDER,
    THINKING_PLACEHOLDER, UNAVAILABLE_PLACEHOLDER,
};
pub use parse::{
    candidate_arguments_or_default, default_candidate_arguments, parse_candidate_arguments,
    CandidateArguments, DEFAULT_CANDIDATE_ARGUMENTS,
};
