use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2 cost and the (deliberately weak) minimum length accepted on registration.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VertexConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    /// Base URL; defaults to the regional `aiplatform.googleapis.com` host.
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl VertexConfig {
    pub fn predict_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub enum ResponderConfig {
    Keyword,
    Vertex(VertexConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub cookie_secure: bool,
    pub responder: ResponderConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("SECRET_KEY must be set"))?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "wizknowledge".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "wizknowledge-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(30),
        };
        if jwt.secret.trim().is_empty() {
            anyhow::bail!("SECRET_KEY must not be empty");
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            min_length: env_parse("PASSWORD_MIN_LENGTH").unwrap_or(defaults.min_length),
            memory_kib: env_parse("ARGON2_MEMORY_KIB").unwrap_or(defaults.memory_kib),
            iterations: env_parse("ARGON2_ITERATIONS").unwrap_or(defaults.iterations),
            parallelism: env_parse("ARGON2_PARALLELISM").unwrap_or(defaults.parallelism),
        };

        let responder = match std::env::var("RESPONDER")
            .unwrap_or_else(|_| "keyword".into())
            .to_lowercase()
            .as_str()
        {
            "keyword" => ResponderConfig::Keyword,
            "vertex" => {
                let location =
                    std::env::var("GCP_LOCATION").unwrap_or_else(|_| "us-central1".into());
                ResponderConfig::Vertex(VertexConfig {
                    project_id: std::env::var("GCP_PROJECT_ID")
                        .map_err(|_| anyhow::anyhow!("GCP_PROJECT_ID must be set for RESPONDER=vertex"))?,
                    endpoint: std::env::var("VERTEX_ENDPOINT")
                        .unwrap_or_else(|_| format!("https://{}-aiplatform.googleapis.com", location)),
                    location,
                    model: std::env::var("VERTEX_MODEL").unwrap_or_else(|_| "text-bison".into()),
                    access_token: std::env::var("GCP_ACCESS_TOKEN").ok(),
                    timeout_secs: env_parse("VERTEX_TIMEOUT_SECS").unwrap_or(30),
                })
            }
            other => anyhow::bail!("unknown RESPONDER {other:?}, expected keyword or vertex"),
        };

        Ok(Self {
            database_url,
            jwt,
            password,
            cookie_secure: env_parse("COOKIE_SECURE").unwrap_or(false),
            responder,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_url_joins_endpoint_and_model() {
        let cfg = VertexConfig {
            project_id: "lab-project".into(),
            location: "us-central1".into(),
            model: "text-bison".into(),
            endpoint: "https://us-central1-aiplatform.googleapis.com/".into(),
            access_token: None,
            timeout_secs: 30,
        };
        assert_eq!(
            cfg.predict_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/lab-project/locations/us-central1/publishers/google/models/text-bison:predict"
        );
    }

    #[test]
    fn password_defaults_keep_lab_minimum() {
        let d = PasswordConfig::default();
        assert_eq!(d.min_length, 3);
        assert_eq!(d.memory_kib, argon2::Params::DEFAULT_M_COST);
    }
}
