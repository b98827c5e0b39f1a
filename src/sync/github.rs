//! GitHub contents API client
//!
//! Notes are stored as `<notes_dir>/<slug>.md` on a single branch. Every
//! write carries the blob SHA we last saw, so a concurrent edit made
//! elsewhere surfaces as [`SyncError::Conflict`] instead of being overwritten.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SyncError;
use crate::core::config::GitHubSettings;
use crate::core::notebook::Notebook;

const USER_AGENT: &str = concat!("inkpad/", env!("CARGO_PKG_VERSION"));

/// Connection settings resolved from [`GitHubSettings`]
#[derive(Debug, Clone, PartialEq)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
    pub notes_dir: String,
    pub api_base: String,
}

impl GitHubConfig {
    pub fn from_settings(settings: &GitHubSettings) -> Result<Self, SyncError> {
        if !settings.is_configured() {
            return Err(SyncError::NotConfigured);
        }
        Ok(Self {
            owner: settings.owner.trim().to_string(),
            repo: settings.repo.trim().to_string(),
            branch: match settings.branch.trim() {
                "" => "main".to_string(),
                b => b.to_string(),
            },
            token: settings.effective_token().trim().to_string(),
            notes_dir: settings.notes_dir.trim().trim_matches('/').to_string(),
            api_base: settings.api_base.trim().trim_end_matches('/').to_string(),
        })
    }

    /// Repository path of a note file
    pub fn note_path(&self, slug: &str) -> String {
        if self.notes_dir.is_empty() {
            format!("{}.md", slug)
        } else {
            format!("{}/{}.md", self.notes_dir, slug)
        }
    }

    /// Browser URL of a note file
    pub fn html_url(&self, slug: &str) -> String {
        format!(
            "https://github.com/{}/{}/blob/{}/{}",
            self.owner,
            self.repo,
            self.branch,
            self.note_path(slug)
        )
    }
}

/// A markdown file in the notes directory
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl RemoteEntry {
    /// Slug derived from the file name
    pub fn slug(&self) -> &str {
        self.name.strip_suffix(".md").unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutPayload<'a> {
    message: String,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DeletePayload<'a> {
    message: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    full_name: String,
    #[serde(default)]
    permissions: Option<RepoPermissions>,
}

#[derive(Debug, Deserialize)]
struct RepoPermissions {
    #[serde(default)]
    push: bool,
}

/// Result of a connection check
#[derive(Debug, Clone, PartialEq)]
pub struct RepoAccess {
    pub full_name: String,
    pub can_push: bool,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn repo_url(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base, self.config.owner, self.config.repo
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/contents/{}", self.repo_url(), path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("GitHub API request failed: {} - {}", status, body);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Unauthorized,
            StatusCode::NOT_FOUND => SyncError::NotFound,
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => SyncError::Conflict,
            _ => SyncError::Http {
                status: status.as_u16(),
                body,
            },
        })
    }

    /// Check that the repository is reachable with the configured token
    pub async fn check_access(&self) -> Result<RepoAccess, SyncError> {
        let response = self.send(self.client.get(self.repo_url())).await?;
        let repo: RepoResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        Ok(RepoAccess {
            full_name: repo.full_name,
            can_push: repo.permissions.map(|p| p.push).unwrap_or(false),
        })
    }

    /// List markdown files in the notes directory. A missing directory is empty.
    pub async fn list_notes(&self) -> Result<Vec<RemoteEntry>, SyncError> {
        let url = self.contents_url(&self.config.notes_dir);
        debug!("Listing notes: {}", url);

        let request = self
            .client
            .get(&url)
            .query(&[("ref", self.config.branch.as_str())]);
        let response = match self.send(request).await {
            Ok(r) => r,
            Err(SyncError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let entries: Vec<RemoteEntry> = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        let mut notes: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|e| e.kind == "file" && e.name.ends_with(".md"))
            .collect();
        notes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(notes)
    }

    /// Download and parse a note
    pub async fn fetch_note(&self, slug: &str) -> Result<Notebook, SyncError> {
        let url = self.contents_url(&self.config.note_path(slug));
        debug!("Fetching note: {}", url);

        let request = self
            .client
            .get(&url)
            .query(&[("ref", self.config.branch.as_str())]);
        let file: FileResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        let text = decode_content(&file.content, &file.encoding)?;
        let mut notebook = Notebook::parse(slug, &text);
        notebook.remote_sha = Some(file.sha);
        Ok(notebook)
    }

    /// Create or update a note. Returns the new blob SHA.
    pub async fn put_note(&self, notebook: &Notebook) -> Result<String, SyncError> {
        let url = self.contents_url(&self.config.note_path(&notebook.slug));
        let verb = if notebook.remote_sha.is_some() {
            "Update"
        } else {
            "Create"
        };
        let payload = PutPayload {
            message: format!("{} {}", verb, notebook.slug),
            content: STANDARD.encode(notebook.to_file_text()),
            branch: &self.config.branch,
            sha: notebook.remote_sha.as_deref(),
        };
        debug!("{} note: {}", verb, url);

        let response: PutResponse = self
            .send(self.client.put(&url).json(&payload))
            .await?
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        Ok(response.content.sha)
    }

    pub async fn delete_note(&self, slug: &str, sha: &str) -> Result<(), SyncError> {
        let url = self.contents_url(&self.config.note_path(slug));
        let payload = DeletePayload {
            message: format!("Delete {}", slug),
            sha,
            branch: &self.config.branch,
        };
        debug!("Deleting note: {}", url);
        self.send(self.client.delete(&url).json(&payload)).await?;
        Ok(())
    }
}

fn decode_content(content: &str, encoding: &str) -> Result<String, SyncError> {
    if !encoding.is_empty() && encoding != "base64" {
        return Err(SyncError::Decode(format!("unsupported encoding: {}", encoding)));
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| SyncError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            owner: "alice".into(),
            repo: "notes".into(),
            branch: "main".into(),
            token: "t0ken".into(),
            notes_dir: "notes".into(),
            api_base: server.uri(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_notes_keeps_markdown_files() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/notes/contents/notes"))
            .and(query_param("ref", "main"))
            .and(header("Authorization", "Bearer t0ken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "b.md", "path": "notes/b.md", "sha": "2", "type": "file", "size": 10},
                {"name": "img.png", "path": "notes/img.png", "sha": "3", "type": "file"},
                {"name": "a.md", "path": "notes/a.md", "sha": "1", "type": "file"},
                {"name": "sub", "path": "notes/sub", "sha": "4", "type": "dir"}
            ])))
            .mount(&server)
            .await;

        let notes = client_for(&server).list_notes().await.unwrap();
        let slugs: Vec<_> = notes.iter().map(|n| n.slug()).collect();
        assert_eq!(slugs, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_notes_dir_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/notes/contents/notes"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert!(client_for(&server).list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_note_decodes_wrapped_base64() {
        let server = MockServer::start().await;
        let text = "---\ntitle: \"Ideas\"\ntags: [misc]\n---\n\n# Ideas\n\nsome text\n";
        let encoded = STANDARD.encode(text);
        let (head, tail) = encoded.split_at(20);
        Mock::given(method("GET"))
            .and(path("/repos/alice/notes/contents/notes/ideas.md"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sha": "abc123",
                "encoding": "base64",
                "content": format!("{}\n{}\n", head, tail),
            })))
            .mount(&server)
            .await;

        let nb = client_for(&server).fetch_note("ideas").await.unwrap();
        assert_eq!(nb.title, "Ideas");
        assert_eq!(nb.tags, vec!["misc"]);
        assert_eq!(nb.content, "# Ideas\n\nsome text\n");
        assert_eq!(nb.remote_sha.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_put_note_sends_sha_when_updating() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/alice/notes/contents/notes/plan.md"))
            .and(body_partial_json(serde_json::json!({
                "message": "Update plan",
                "sha": "old",
                "branch": "main"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": {"sha": "new", "name": "plan.md"},
                "commit": {"sha": "c1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut nb = Notebook::new("Plan");
        nb.remote_sha = Some("old".into());
        let sha = client_for(&server).put_note(&nb).await.unwrap();
        assert_eq!(sha, "new");
    }

    #[tokio::test]
    async fn test_stale_sha_is_a_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_string("sha mismatch"))
            .mount(&server)
            .await;

        let mut nb = Notebook::new("Plan");
        nb.remote_sha = Some("stale".into());
        let err = client_for(&server).put_note(&nb).await.unwrap_err();
        assert_eq!(err, SyncError::Conflict);
    }

    #[tokio::test]
    async fn test_bad_token_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/notes"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).check_access().await.unwrap_err();
        assert_eq!(err, SyncError::Unauthorized);
    }

    #[tokio::test]
    async fn test_delete_note() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/alice/notes/contents/notes/old.md"))
            .and(body_partial_json(serde_json::json!({"sha": "s1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": null,
                "commit": {"sha": "c2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_note("old", "s1").await.unwrap();
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        assert!(matches!(
            decode_content("abc", "none"),
            Err(SyncError::Decode(_))
        ));
    }
}
