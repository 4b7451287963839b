/// SQL DDL for the rostra database.
/// WAL mode + foreign keys enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS debates (
    id TEXT PRIMARY KEY,
    topic TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'setup',
    max_turns INTEGER NOT NULL,
    turn_seconds INTEGER NOT NULL,
    research_depth TEXT NOT NULL,
    speech_enabled INTEGER NOT NULL DEFAULT 0,
    fact_checking_enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    role TEXT NOT NULL,
    display_name TEXT NOT NULL,
    persona TEXT NOT NULL DEFAULT '',
    voice_id TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS turns (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    participant_id TEXT NOT NULL REFERENCES participants(id),
    turn_no INTEGER NOT NULL,
    turn_type TEXT NOT NULL,
    argument TEXT NOT NULL,
    citations TEXT NOT NULL DEFAULT '[]',
    sources TEXT NOT NULL DEFAULT '[]',
    audio_url TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(debate_id, turn_no)
);

CREATE TABLE IF NOT EXISTS claim_verdicts (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    turn_id TEXT NOT NULL REFERENCES turns(id),
    participant_id TEXT NOT NULL REFERENCES participants(id),
    claim TEXT NOT NULL,
    verdict TEXT NOT NULL,
    explanation TEXT NOT NULL DEFAULT '',
    confidence REAL NOT NULL,
    is_lie INTEGER NOT NULL,
    sources TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    verdict_id TEXT NOT NULL REFERENCES claim_verdicts(id),
    participant_name TEXT NOT NULL,
    claim TEXT NOT NULL,
    explanation TEXT NOT NULL DEFAULT '',
    severity TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS summaries (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL UNIQUE REFERENCES debates(id),
    overall TEXT NOT NULL,
    winner_analysis TEXT NOT NULL DEFAULT '',
    accuracy_scores TEXT NOT NULL DEFAULT '{}',
    key_arguments TEXT NOT NULL DEFAULT '[]',
    verdict_counts TEXT NOT NULL DEFAULT '{}',
    sources_used TEXT NOT NULL DEFAULT '[]',
    recommendations TEXT NOT NULL DEFAULT '',
    votes_pro INTEGER NOT NULL DEFAULT 0,
    votes_con INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(debate_id, url)
);

CREATE TABLE IF NOT EXISTS votes (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    side TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS media (
    id TEXT PRIMARY KEY,
    debate_id TEXT NOT NULL REFERENCES debates(id),
    content_type TEXT NOT NULL,
    data BLOB NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_participants_debate ON participants(debate_id);
CREATE INDEX IF NOT EXISTS idx_turns_debate ON turns(debate_id, turn_no);
CREATE INDEX IF NOT EXISTS idx_verdicts_debate ON claim_verdicts(debate_id);
CREATE INDEX IF NOT EXISTS idx_verdicts_turn ON claim_verdicts(turn_id);
CREATE INDEX IF NOT EXISTS idx_alerts_debate ON alerts(debate_id);
CREATE INDEX IF NOT EXISTS idx_documents_debate ON documents(debate_id);
CREATE INDEX IF NOT EXISTS idx_votes_debate ON votes(debate_id);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
