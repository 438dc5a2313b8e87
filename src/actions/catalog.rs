//! The seven Elfa API actions.

use super::schema::{DefaultValue, ExtractionSchema, FieldKind, FieldSpec};
use super::ActionDescriptor;

const MENTION_SUMMARY: &str = "Summarize these social media mentions. For each notable post \
mention the date, the post metrics (likes, reposts, views, replies) and what the content says. \
Close with the overall sentiment if one is apparent.";

pub const PING: ActionDescriptor = ActionDescriptor {
    name: "ELFA_PING",
    similes: &["ping elfa", "elfa health check", "check elfa api", "elfa status"],
    description: "Checks the health of the Elfa AI API by pinging it.",
    path: "/v1/ping",
    schema: ExtractionSchema::EMPTY,
    subject: "ping",
    activity: "pinging the Elfa API",
    example: "{}",
    summary_instruction: "Report whether the Elfa API is reachable and healthy.",
};

pub const KEY_STATUS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_API_KEY_STATUS",
    similes: &["elfa key status", "check elfa api key", "elfa usage", "elfa api key status"],
    description: "Retrieves the status and usage details of the Elfa AI API key.",
    path: "/v1/key-status",
    schema: ExtractionSchema::EMPTY,
    subject: "API key status",
    activity: "retrieving API key status",
    example: "{}",
    summary_instruction: "Describe the API key status: whether it is active, its usage so far, \
remaining request limits, and when it expires if stated.",
};

const SMART_MENTIONS_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "limit",
        FieldKind::Number,
        DefaultValue::Int(100),
        "Number of mentions to return",
    ),
    FieldSpec::optional(
        "offset",
        FieldKind::Number,
        DefaultValue::Int(0),
        "Number of mentions to skip",
    ),
];

pub const SMART_MENTIONS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_GET_SMART_MENTIONS",
    similes: &["smart mentions", "get smart mentions", "elfa mentions", "smart crypto mentions"],
    description: "Retrieves tweets by smart accounts with smart engagement from the Elfa AI API.",
    path: "/v1/mentions",
    schema: ExtractionSchema::new(SMART_MENTIONS_FIELDS),
    subject: "smart mentions",
    activity: "retrieving smart mentions",
    example: r#"{"limit": 50, "offset": 0}"#,
    summary_instruction: MENTION_SUMMARY,
};

const TOP_MENTIONS_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "ticker",
        FieldKind::String,
        "Ticker or token symbol to search for, e.g. SOL or $SOL",
    ),
    FieldSpec::optional(
        "timeWindow",
        FieldKind::String,
        DefaultValue::Str("1h"),
        "Time window such as 1h, 24h or 7d",
    ),
    FieldSpec::optional("page", FieldKind::Number, DefaultValue::Int(1), "Page number"),
    FieldSpec::optional(
        "pageSize",
        FieldKind::Number,
        DefaultValue::Int(10),
        "Results per page",
    ),
    FieldSpec::optional(
        "includeAccountDetails",
        FieldKind::Boolean,
        DefaultValue::Bool(false),
        "Whether to include details of the posting accounts",
    ),
];

pub const TOP_MENTIONS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_GET_TOP_MENTIONS",
    similes: &["top mentions", "get top mentions", "top tweets for ticker", "ticker mentions"],
    description: "Retrieves the top tweets for a specific stock ticker or token symbol, ranked \
by view count.",
    path: "/v1/top-mentions",
    schema: ExtractionSchema::new(TOP_MENTIONS_FIELDS),
    subject: "top mentions",
    activity: "retrieving top mentions",
    example: r#"{"ticker": "SOL", "timeWindow": "24h", "page": 1, "pageSize": 10, "includeAccountDetails": false}"#,
    summary_instruction: MENTION_SUMMARY,
};

const SEARCH_MENTIONS_FIELDS: &[FieldSpec] = &[
    FieldSpec::required(
        "keywords",
        FieldKind::String,
        "Comma separated keywords to search for",
    ),
    FieldSpec::required(
        "from",
        FieldKind::Number,
        "Start of the range as a unix timestamp in seconds",
    ),
    FieldSpec::required(
        "to",
        FieldKind::Number,
        "End of the range as a unix timestamp in seconds",
    ),
    FieldSpec::optional(
        "limit",
        FieldKind::Number,
        DefaultValue::Int(20),
        "Maximum number of mentions to return",
    ),
];

pub const SEARCH_MENTIONS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_SEARCH_MENTIONS_BY_KEYWORDS",
    similes: &["search mentions", "search tweets", "keyword mentions", "find mentions"],
    description: "Searches for tweets mentioning specific keywords within a time range.",
    path: "/v1/mentions/search",
    schema: ExtractionSchema::new(SEARCH_MENTIONS_FIELDS),
    subject: "search mentions",
    activity: "searching mentions",
    example: r#"{"keywords": "bitcoin, etf", "from": 1738675001, "to": 1738775001, "limit": 20}"#,
    summary_instruction: MENTION_SUMMARY,
};

const TRENDING_TOKENS_FIELDS: &[FieldSpec] = &[
    FieldSpec::optional(
        "timeWindow",
        FieldKind::String,
        DefaultValue::Str("24h"),
        "Time window such as 1h, 24h or 7d",
    ),
    FieldSpec::optional("page", FieldKind::Number, DefaultValue::Int(1), "Page number"),
    FieldSpec::optional(
        "pageSize",
        FieldKind::Number,
        DefaultValue::Int(50),
        "Results per page",
    ),
    FieldSpec::optional(
        "minMentions",
        FieldKind::Number,
        DefaultValue::Int(5),
        "Minimum number of mentions for a token to be listed",
    ),
];

pub const TRENDING_TOKENS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_GET_TRENDING_TOKENS",
    similes: &["trending tokens", "get trending tokens", "trending crypto", "hot tokens"],
    description: "Retrieves the tokens with the most mentions across social media.",
    path: "/v1/trending-tokens",
    schema: ExtractionSchema::new(TRENDING_TOKENS_FIELDS),
    subject: "trending tokens",
    activity: "retrieving trending tokens",
    example: r#"{"timeWindow": "24h", "page": 1, "pageSize": 50, "minMentions": 5}"#,
    summary_instruction: "List the trending tokens in rank order with their mention counts and \
the change in mentions where available. Point out any token whose mentions are rising sharply.",
};

const ACCOUNT_STATS_FIELDS: &[FieldSpec] = &[FieldSpec::required(
    "username",
    FieldKind::String,
    "Twitter/X username without the leading @",
)];

pub const ACCOUNT_STATS: ActionDescriptor = ActionDescriptor {
    name: "ELFA_TWITTER_ACCOUNT_STATS",
    similes: &["account stats", "twitter account stats", "smart stats", "account smart stats"],
    description: "Retrieves smart engagement statistics for a Twitter/X account.",
    path: "/v1/account/smart-stats",
    schema: ExtractionSchema::new(ACCOUNT_STATS_FIELDS),
    subject: "account stats",
    activity: "retrieving account stats",
    example: r#"{"username": "elonmusk"}"#,
    summary_instruction: "Describe the account's smart engagement: smart following count, \
engagement score, and average engagement, and what they say about the account's reach.",
};

/// Every Elfa action, in registration order.
pub fn all() -> Vec<ActionDescriptor> {
    vec![
        PING,
        KEY_STATUS,
        SMART_MENTIONS,
        TOP_MENTIONS,
        SEARCH_MENTIONS,
        TRENDING_TOKENS,
        ACCOUNT_STATS,
    ]
}
