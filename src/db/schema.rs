/// Bumped whenever a table changes shape. A database carrying any other
/// non-zero version is wiped and recreated.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT NOT NULL,
    description TEXT,
    owner_avatar_url TEXT NOT NULL,
    html_url TEXT NOT NULL,
    stargazers_count INTEGER,
    forks_count INTEGER,
    open_issues_count INTEGER,
    last_updated TEXT,
    language TEXT,
    license TEXT
);

CREATE INDEX IF NOT EXISTS idx_repositories_language
    ON repositories(language COLLATE NOCASE);

CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    avatar_url TEXT NOT NULL
);

-- One row per search query; the default feed derives its cursor from repositories
CREATE TABLE IF NOT EXISTS remote_pages (
    query TEXT NOT NULL PRIMARY KEY COLLATE NOCASE,
    next_page INTEGER
);
"#;

pub const DROP_ALL: &str = r#"
DROP TABLE IF EXISTS repositories;
DROP TABLE IF EXISTS owners;
DROP TABLE IF EXISTS remote_pages;
"#;
