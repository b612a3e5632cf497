use sqlx::MySqlPool;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            VARCHAR(36)  NOT NULL PRIMARY KEY,
        name          VARCHAR(255) NOT NULL,
        email         VARCHAR(255) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        role          VARCHAR(16)  NOT NULL,
        position      VARCHAR(255) NOT NULL,
        region        VARCHAR(255) NOT NULL,
        institution   VARCHAR(255) NOT NULL,
        phone         VARCHAR(64)  NOT NULL DEFAULT '',
        created_at    TIMESTAMP    NOT NULL,
        UNIQUE KEY uq_users_email (email),
        KEY idx_users_role (role)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendances (
        id           VARCHAR(36)  NOT NULL PRIMARY KEY,
        user_id      VARCHAR(36)  NOT NULL,
        name         VARCHAR(255) NOT NULL,
        position     VARCHAR(255) NOT NULL,
        region       VARCHAR(255) NOT NULL,
        institution  VARCHAR(255) NOT NULL,
        status       CHAR(1)      NOT NULL,
        note         TEXT         NOT NULL,
        date         DATE         NOT NULL,
        submitted_at CHAR(5)      NOT NULL,
        created_at   TIMESTAMP    NOT NULL,
        UNIQUE KEY uq_attendance_user_date (user_id, date),
        KEY idx_attendance_date (date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        id            VARCHAR(32)  NOT NULL PRIMARY KEY,
        activity_name VARCHAR(255) NOT NULL,
        date          DATE         NOT NULL,
        open_time     CHAR(5)      NOT NULL,
        close_time    CHAR(5)      NOT NULL,
        is_active     BOOLEAN      NOT NULL,
        updated_at    TIMESTAMP    NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id         BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        user_id    VARCHAR(36)     NOT NULL,
        jti        VARCHAR(64)     NOT NULL,
        expires_at TIMESTAMP       NOT NULL,
        revoked    BOOLEAN         NOT NULL DEFAULT FALSE,
        UNIQUE KEY uq_refresh_jti (jti)
    )
    "#,
];

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPool::connect(database_url).await?;

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }

    Ok(pool)
}
