use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Idempotent DDL, applied in dependency order
pub const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            password_hash VARCHAR(255) NOT NULL,
            role VARCHAR(20) NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
            avatar_url TEXT,
            created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "categories",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            description TEXT
        )
        "#,
    ),
    (
        "courses",
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id SERIAL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
            instructor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
            price NUMERIC(10, 2) NOT NULL DEFAULT 0,
            difficulty_level VARCHAR(20) NOT NULL DEFAULT 'beginner',
            is_published BOOLEAN NOT NULL DEFAULT FALSE,
            duration_minutes INTEGER NOT NULL DEFAULT 0,
            thumbnail_url TEXT,
            created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "videos",
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id SERIAL PRIMARY KEY,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            video_url TEXT NOT NULL,
            thumbnail_url TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            order_index INTEGER NOT NULL DEFAULT 0,
            is_free BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "user_courses",
        r#"
        CREATE TABLE IF NOT EXISTS user_courses (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            course_id INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            enrolled_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
            progress_percentage INTEGER NOT NULL DEFAULT 0,
            completed_at TIMESTAMP WITH TIME ZONE,
            UNIQUE (user_id, course_id)
        )
        "#,
    ),
    (
        "user_video_progress",
        r#"
        CREATE TABLE IF NOT EXISTS user_video_progress (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
            is_completed BOOLEAN NOT NULL DEFAULT FALSE,
            watched_seconds INTEGER NOT NULL DEFAULT 0,
            updated_at TIMESTAMP WITH TIME ZONE DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (user_id, video_id)
        )
        "#,
    ),
    (
        "tokens",
        r#"
        CREATE TABLE IF NOT EXISTS tokens (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            token_hash VARCHAR(255) NOT NULL UNIQUE,
            expires_at TIMESTAMP WITH TIME ZONE NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
            last_used_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
            revoked BOOLEAN NOT NULL DEFAULT FALSE,
            device_info TEXT,
            ip_address INET
        )
        "#,
    ),
    ("idx_tokens_user_id", "CREATE INDEX IF NOT EXISTS idx_tokens_user_id ON tokens(user_id)"),
    ("idx_tokens_hash", "CREATE INDEX IF NOT EXISTS idx_tokens_hash ON tokens(token_hash)"),
    ("idx_tokens_expires_at", "CREATE INDEX IF NOT EXISTS idx_tokens_expires_at ON tokens(expires_at)"),
    ("idx_tokens_revoked", "CREATE INDEX IF NOT EXISTS idx_tokens_revoked ON tokens(revoked)"),
];

/// Create every table and index that does not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<usize, DatabaseError> {
    for (name, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        info!("Ensured {}", name);
    }
    Ok(SCHEMA.len())
}
