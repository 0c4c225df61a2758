//! Jenkins HTTP adapter over `ureq`, authenticated with basic auth.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use hottest_core::CanonicalPath;
use hottest_sync::transport::FOLDER_CLASS;
use hottest_sync::{Artifact, CiServer, RemoteJob, TransportError};

use crate::config::Connection;

const XML: &str = "application/xml";
const NODE_TYPE: &str = "hudson.slaves.DumbSlave$DescriptorImpl";

pub struct Jenkins {
    agent: ureq::Agent,
    base: Url,
    auth: Option<String>,
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Deserialize)]
struct JobEntry {
    name: String,
    #[serde(rename = "_class")]
    class: String,
}

#[derive(Deserialize)]
struct ComputerList {
    #[serde(default)]
    computer: Vec<Computer>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Computer {
    display_name: String,
}

#[derive(Deserialize)]
struct PropertyList {
    #[serde(default)]
    property: Vec<Property>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Property {
    #[serde(default)]
    parameter_definitions: Vec<ParameterDefinition>,
}

#[derive(Deserialize)]
struct ParameterDefinition {
    name: String,
}

impl Jenkins {
    pub fn connect(conn: &Connection) -> Result<Self, TransportError> {
        let mut raw = conn.url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).map_err(|e| TransportError::Request {
            url: conn.url.clone(),
            message: e.to_string(),
        })?;
        let auth = conn.user.as_ref().map(|user| {
            let secret = conn.token.clone().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{user}:{secret}")))
        });
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .build();
        Ok(Jenkins { agent, base, auth })
    }

    /// `base/job/a/job/b/` followed by `tail` segments.
    fn url(&self, prefix: &[&str], tail: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Request {
                url: self.base.to_string(),
                message: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(prefix)
            .extend(tail);
        Ok(url)
    }

    fn job_url(&self, path: &CanonicalPath, tail: &[&str]) -> Result<Url, TransportError> {
        let prefix: Vec<&str> = path.segments().flat_map(|s| ["job", s]).collect();
        self.url(&prefix, tail)
    }

    fn node_url(&self, name: &str, tail: &[&str]) -> Result<Url, TransportError> {
        self.url(&["computer", name], tail)
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let req = self.agent.request_url(method, url);
        match &self.auth {
            Some(auth) => req.set("Authorization", auth),
            None => req,
        }
    }

    fn get_text(&self, url: &Url, what: &str) -> Result<String, TransportError> {
        tracing::debug!("GET {url}");
        let resp = self.request("GET", url).call().map_err(|e| map_err(url, what, e))?;
        resp.into_string().map_err(|e| decode_err(url, e))
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &Url, what: &str) -> Result<T, TransportError> {
        tracing::debug!("GET {url}");
        let resp = self.request("GET", url).call().map_err(|e| map_err(url, what, e))?;
        resp.into_json().map_err(|e| decode_err(url, e))
    }

    fn post_xml(&self, url: &Url, what: &str, body: &str) -> Result<(), TransportError> {
        tracing::debug!("POST {url}");
        self.request("POST", url)
            .set("Content-Type", XML)
            .send_string(body)
            .map_err(|e| map_err(url, what, e))?;
        Ok(())
    }

    fn list_folder(&self, folder: &CanonicalPath) -> Result<Vec<RemoteJob>, TransportError> {
        let mut url = self.job_url(folder, &["api", "json"])?;
        url.query_pairs_mut().append_pair("tree", "jobs[name,_class]");
        let list: JobList = self.get_json(&url, &format!("folder \"{folder}\""))?;

        let mut out = Vec::with_capacity(list.jobs.len());
        for entry in list.jobs {
            let mut job = RemoteJob::new(&entry.name, &entry.class);
            if entry.class == FOLDER_CLASS {
                job.children = self.list_folder(&folder.join(&entry.name))?;
            }
            out.push(job);
        }
        Ok(out)
    }
}

fn map_err(url: &Url, what: &str, err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Status(404, _) => TransportError::NotFound {
            what: what.to_string(),
        },
        ureq::Error::Status(status, resp) => TransportError::Status {
            url: url.to_string(),
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => TransportError::Request {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

fn decode_err(url: &Url, err: std::io::Error) -> TransportError {
    TransportError::Decode {
        url: url.to_string(),
        message: err.to_string(),
    }
}

impl CiServer for Jenkins {
    fn list_jobs(&self) -> Result<Vec<RemoteJob>, TransportError> {
        self.list_folder(&CanonicalPath::root())
    }

    fn list_nodes(&self) -> Result<Vec<String>, TransportError> {
        let mut url = self.url(&["computer", "api", "json"], &[])?;
        url.query_pairs_mut().append_pair("tree", "computer[displayName]");
        let list: ComputerList = self.get_json(&url, "node list")?;
        Ok(list.computer.into_iter().map(|c| c.display_name).collect())
    }

    fn get_job_config(&self, path: &CanonicalPath) -> Result<String, TransportError> {
        let url = self.job_url(path, &["config.xml"])?;
        self.get_text(&url, &format!("job \"{path}\""))
    }

    fn set_job_config(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        let url = self.job_url(path, &["config.xml"])?;
        self.post_xml(&url, &format!("job \"{path}\""), &artifact.document)
    }

    fn create_job(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        let parent = path.parent().unwrap_or_else(CanonicalPath::root);
        let mut url = self.job_url(&parent, &["createItem"])?;
        url.query_pairs_mut().append_pair("name", path.leaf());
        self.post_xml(&url, &format!("folder \"{parent}\""), &artifact.document)
    }

    fn get_node_config(&self, name: &str) -> Result<String, TransportError> {
        let url = self.node_url(name, &["config.xml"])?;
        self.get_text(&url, &format!("node \"{name}\""))
    }

    fn set_node_config(&mut self, name: &str, artifact: &Artifact) -> Result<(), TransportError> {
        let url = self.node_url(name, &["config.xml"])?;
        self.post_xml(&url, &format!("node \"{name}\""), &artifact.document)
    }

    fn create_node(&mut self, name: &str) -> Result<(), TransportError> {
        let url = self.url(&["computer", "doCreateItem"], &[])?;
        let form = json!({
            "name": name,
            "nodeDescription": "",
            "numExecutors": "1",
            "remoteFS": "/",
            "labelString": "",
            "mode": "NORMAL",
            "type": NODE_TYPE,
            "retentionStrategy": { "stapler-class": "hudson.slaves.RetentionStrategy$Always" },
            "nodeProperties": { "stapler-class-bag": "true" },
            "launcher": { "stapler-class": "hudson.slaves.JNLPLauncher" },
        })
        .to_string();

        tracing::debug!("POST {url}");
        self.request("POST", &url)
            .send_form(&[("name", name), ("type", NODE_TYPE), ("json", form.as_str())])
            .map_err(|e| map_err(&url, &format!("node \"{name}\""), e))?;
        Ok(())
    }

    fn job_parameters(&self, path: &CanonicalPath) -> Result<Vec<String>, TransportError> {
        let mut url = self.job_url(path, &["api", "json"])?;
        url.query_pairs_mut()
            .append_pair("tree", "property[parameterDefinitions[name]]");
        let list: PropertyList = self.get_json(&url, &format!("job \"{path}\""))?;
        Ok(list
            .property
            .into_iter()
            .flat_map(|p| p.parameter_definitions)
            .map(|d| d.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(url: &str) -> Jenkins {
        Jenkins::connect(&Connection {
            url: url.to_string(),
            user: Some("bot".to_string()),
            token: Some("secret".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn job_urls_nest_folders() {
        let j = server("http://ci:8080/jenkins");
        let url = j.job_url(&"team/a b".into(), &["config.xml"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://ci:8080/jenkins/job/team/job/a%20b/config.xml"
        );
    }

    #[test]
    fn root_job_url_is_the_base() {
        let j = server("http://ci:8080/");
        let url = j.job_url(&CanonicalPath::root(), &["createItem"]).unwrap();
        assert_eq!(url.as_str(), "http://ci:8080/createItem");
    }

    #[test]
    fn node_urls_live_under_computer() {
        let j = server("http://ci:8080");
        let url = j.node_url("evk-1", &["config.xml"]).unwrap();
        assert_eq!(url.as_str(), "http://ci:8080/computer/evk-1/config.xml");
    }

    #[test]
    fn basic_auth_header_is_encoded() {
        let j = server("http://ci:8080");
        assert_eq!(j.auth.as_deref(), Some("Basic Ym90OnNlY3JldA=="));
    }

    #[test]
    fn invalid_url_is_a_request_error() {
        let err = Jenkins::connect(&Connection {
            url: "not a url".to_string(),
            user: None,
            token: None,
        })
        .err()
        .unwrap();
        assert!(matches!(err, TransportError::Request { .. }));
    }
}
