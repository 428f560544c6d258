//! SQL statements.
//!
//! Written with PostgreSQL `$N` placeholders. SQLite accepts the same
//! positions as `?N`; see [`SqlStore::sql`](super::SqlStore).

/// Schema (PostgreSQL).
pub const SCHEMA_PG: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    id TEXT PRIMARY KEY,
    email TEXT,
    subscription_tier TEXT NOT NULL DEFAULT 'free',
    storage_used_bytes BIGINT NOT NULL DEFAULT 0,
    last_clamped_bytes BIGINT NOT NULL DEFAULT 0,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS experiences (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at BIGINT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    storage_path TEXT NOT NULL UNIQUE,
    experience_id TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    size_bytes BIGINT NOT NULL DEFAULT 0,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_images_owner ON images(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_experiences_owner ON experiences(owner_id)",
];

/// Schema (SQLite).
pub const SCHEMA_SQLITE: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS user_profiles (
    id TEXT PRIMARY KEY,
    email TEXT,
    subscription_tier TEXT NOT NULL DEFAULT 'free',
    storage_used_bytes INTEGER NOT NULL DEFAULT 0,
    last_clamped_bytes INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS experiences (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    storage_path TEXT NOT NULL UNIQUE,
    experience_id TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    size_bytes INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_images_owner ON images(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_experiences_owner ON experiences(owner_id)",
];

pub const IMAGE_COLUMNS: &str =
    "id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at";

pub const GET_PROFILE: &str = r#"
SELECT id, email, subscription_tier, storage_used_bytes, created_at, updated_at
FROM user_profiles
WHERE id = $1
"#;

pub const LIST_PROFILES: &str = r#"
SELECT id, email, subscription_tier, storage_used_bytes, created_at, updated_at
FROM user_profiles
ORDER BY created_at, id
"#;

pub const INSERT_PROFILE_IF_ABSENT: &str = r#"
INSERT INTO user_profiles (id, email, subscription_tier, storage_used_bytes, last_clamped_bytes, created_at, updated_at)
VALUES ($1, $2, $3, $4, 0, $5, $6)
ON CONFLICT (id) DO NOTHING
"#;

pub const SET_TIER: &str = r#"
UPDATE user_profiles
SET subscription_tier = $1, updated_at = $2
WHERE id = $3
"#;

/// Relative usage update, clamped at zero. Old values are visible to every
/// SET expression, so the clamp amount is computed from the same row state.
pub const ADD_STORAGE_USED: &str = r#"
UPDATE user_profiles
SET storage_used_bytes = CASE WHEN storage_used_bytes + $1 < 0 THEN 0 ELSE storage_used_bytes + $1 END,
    last_clamped_bytes = CASE WHEN storage_used_bytes + $1 < 0 THEN -(storage_used_bytes + $1) ELSE 0 END,
    updated_at = $2
WHERE id = $3
RETURNING storage_used_bytes, last_clamped_bytes
"#;

pub const RECONCILE_USAGE: &str = r#"
UPDATE user_profiles
SET storage_used_bytes = (SELECT COALESCE(SUM(size_bytes), 0) FROM images WHERE images.owner_id = user_profiles.id),
    updated_at = $1
"#;

pub const GET_IMAGE: &str = r#"
SELECT id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at
FROM images
WHERE owner_id = $1 AND id = $2
"#;

pub const FIND_IMAGE_BY_PATH: &str = r#"
SELECT id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at
FROM images
WHERE owner_id = $1 AND storage_path = $2
"#;

pub const LIST_IMAGES: &str = r#"
SELECT id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at
FROM images
WHERE owner_id = $1
ORDER BY created_at DESC, id
"#;

pub const INSERT_IMAGE: &str = r#"
INSERT INTO images (id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;

pub const SET_IMAGE_EXPERIENCE: &str = r#"
UPDATE images
SET experience_id = $1, updated_at = $2
WHERE owner_id = $3 AND id = $4
RETURNING id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at
"#;

pub const DELETE_IMAGE: &str = r#"
DELETE FROM images
WHERE owner_id = $1 AND id = $2
RETURNING id, owner_id, storage_path, experience_id, metadata, size_bytes, created_at, updated_at
"#;

pub const GET_EXPERIENCE: &str = r#"
SELECT id, owner_id, title, created_at
FROM experiences
WHERE owner_id = $1 AND id = $2
"#;

pub const LIST_EXPERIENCES: &str = r#"
SELECT id, owner_id, title, created_at
FROM experiences
WHERE owner_id = $1
ORDER BY created_at, id
"#;

pub const COUNT_EXPERIENCES: &str = r#"
SELECT COUNT(*) AS n FROM experiences WHERE owner_id = $1
"#;

pub const INSERT_EXPERIENCE: &str = r#"
INSERT INTO experiences (id, owner_id, title, created_at)
VALUES ($1, $2, $3, $4)
"#;

/// `$first, $first+1, ...` for an `IN (...)` list of `n` values.
pub fn placeholders(first: usize, n: usize) -> String {
    (first..first + n)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}
