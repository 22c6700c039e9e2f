//! Guided conversation protocol for collecting trip inputs.
//!
//! The server keeps no session: every turn carries the client's current
//! stage and inputs, and [`advance`] decides what to say and where to go next.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, FastestRoute, ScenicRoute, TripPlan};

/// Trip length used when the user never states one.
pub const DEFAULT_TRIP_DAYS: u32 = 3;

pub const GREETING_MESSAGE: &str = "Hello! I'm your AI travel assistant. I can help you plan a trip in Mongolia. To get started, please pin your starting place and your destination on the map.";
pub const MISSING_PINS_MESSAGE: &str =
    "Please select both a starting point and a destination on the map.";
pub const DETAILS_PROMPT_MESSAGE: &str = "Great! I have your route. Now, tell me: How many days are you planning to travel? And what kind of places do you want to visit? (e.g., nature, historical, museums, food)";
pub const COMPLETED_MESSAGE: &str =
    "Your trip plan is ready. Start a new conversation to plan another trip.";
pub const UNKNOWN_STAGE_MESSAGE: &str = "Unknown stage.";

/// Stage of the trip-planning conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Initial,
    WaitingForPins,
    WaitingForInfo,
    Completed,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::WaitingForPins => "WAITING_FOR_PINS",
            Self::WaitingForInfo => "WAITING_FOR_INFO",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIAL" => Ok(Self::Initial),
            "WAITING_FOR_PINS" => Ok(Self::WaitingForPins),
            "WAITING_FOR_INFO" => Ok(Self::WaitingForInfo),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Inputs collected by the client so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One client turn of the planning endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Kept as text so unknown or missing stages get a reply instead of a
    /// decode error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default)]
    pub user_inputs: UserInputs,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Reply to a client turn. Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<ConversationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fastest_route: Option<FastestRoute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenic_route: Option<ScenicRoute>,
}

impl ChatResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A protocol reply; `next_stage` is `None` when the stage stays put.
    pub fn reply(message: impl Into<String>, next_stage: Option<ConversationState>) -> Self {
        Self {
            message: Some(message.into()),
            next_stage,
            ..Self::default()
        }
    }

    /// A finished plan; the conversation moves to `COMPLETED`.
    pub fn from_plan(plan: TripPlan) -> Self {
        Self {
            message: None,
            explanation: plan.explanation,
            next_stage: Some(ConversationState::Completed),
            fastest_route: Some(plan.fastest_route),
            scenic_route: Some(plan.scenic_route),
        }
    }
}

/// Everything plan synthesis needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub start: Coordinate,
    pub end: Coordinate,
    pub days: u32,
    pub preferences: String,
}

/// What the server should do for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Answer directly; `next_stage` is `None` when the stage stays put.
    Reply {
        message: &'static str,
        next_stage: Option<ConversationState>,
    },
    /// Inputs are complete; synthesize a plan.
    Plan(TripRequest),
}

impl StageOutcome {
    fn stay(message: &'static str) -> Self {
        Self::Reply {
            message,
            next_stage: None,
        }
    }

    fn move_to(message: &'static str, next_stage: ConversationState) -> Self {
        Self::Reply {
            message,
            next_stage: Some(next_stage),
        }
    }
}

/// Decide the response for a turn reported at `stage`.
pub fn advance(stage: Option<&str>, inputs: &UserInputs) -> StageOutcome {
    let Some(Ok(stage)) = stage.map(str::parse::<ConversationState>) else {
        return StageOutcome::stay(UNKNOWN_STAGE_MESSAGE);
    };

    match stage {
        ConversationState::Initial => {
            StageOutcome::move_to(GREETING_MESSAGE, ConversationState::WaitingForPins)
        }
        ConversationState::WaitingForPins => {
            if inputs.start.is_none() || inputs.end.is_none() {
                return StageOutcome::stay(MISSING_PINS_MESSAGE);
            }
            StageOutcome::move_to(DETAILS_PROMPT_MESSAGE, ConversationState::WaitingForInfo)
        }
        ConversationState::WaitingForInfo => {
            let (Some(start), Some(end)) = (inputs.start, inputs.end) else {
                return StageOutcome::stay(MISSING_PINS_MESSAGE);
            };
            let (days, preferences) = parse_trip_details(
                inputs.days,
                inputs.preferences.as_deref(),
                inputs.last_user_message.as_deref(),
            );
            StageOutcome::Plan(TripRequest {
                start,
                end,
                days,
                preferences,
            })
        }
        ConversationState::Completed => StageOutcome::stay(COMPLETED_MESSAGE),
    }
}

fn days_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*days?\b").expect("valid day-count pattern"))
}

/// Resolve trip length and preference text.
///
/// Without an explicit day count the free-text message is searched for
/// "N day(s)" and used verbatim as the preferences.
pub fn parse_trip_details(
    days: Option<u32>,
    preferences: Option<&str>,
    last_user_message: Option<&str>,
) -> (u32, String) {
    let explicit_days = days.filter(|d| *d > 0);

    match (explicit_days, last_user_message) {
        (None, Some(message)) => {
            let parsed = days_pattern()
                .captures(message)
                .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_TRIP_DAYS);
            (parsed, message.to_string())
        }
        (days, _) => (
            days.unwrap_or(DEFAULT_TRIP_DAYS),
            preferences.unwrap_or_default().to_string(),
        ),
    }
}
