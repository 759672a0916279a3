//! Template Renderer (C2) — render each `TemplatePair` against the active
//! `Snapshot` variant. Per-template failures are isolated: one bad template
//! never prevents its siblings from being considered (Invariant 6).

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{Pod, Service, Snapshot};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("reading template source: {0}")]
    Read(#[from] std::io::Error),
    #[error("parsing template: {0}")]
    Parse(#[source] tera::Error),
    #[error("executing template: {0}")]
    Exec(#[source] tera::Error),
}

/// Render one template source against the active snapshot. The snapshot
/// variant selects the context shape exposed to the template: Swarm
/// exposes `services`, Kubernetes exposes `apps`.
pub fn render(src: &std::path::Path, snapshot: &Snapshot) -> Result<Vec<u8>, RenderError> {
    let source = std::fs::read_to_string(src)?;

    let mut tera = tera::Tera::default();
    tera.add_raw_template("pair", &source).map_err(RenderError::Parse)?;

    let context = build_context(snapshot);
    let rendered = tera.render("pair", &context).map_err(RenderError::Exec)?;
    Ok(rendered.into_bytes())
}

fn build_context(snapshot: &Snapshot) -> tera::Context {
    let mut ctx = tera::Context::new();
    match snapshot {
        Snapshot::Swarm(services) => ctx.insert("services", &services_view(services)),
        Snapshot::Kubernetes(apps) => ctx.insert("apps", &apps_view(apps)),
    }
    ctx
}

fn services_view(services: &[Service]) -> &[Service] {
    services
}

fn apps_view(apps: &BTreeMap<String, Vec<Pod>>) -> &BTreeMap<String, Vec<Pod>> {
    apps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Endpoint;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_template(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn renders_swarm_snapshot() {
        let svc = Service::new(
            "api".to_string(),
            HashMap::new(),
            vec![
                Endpoint { hostname: "api-1".to_string(), address: "10.0.0.2".to_string() },
                Endpoint { hostname: "api-2".to_string(), address: "10.0.0.3".to_string() },
            ],
        );
        let snapshot = Snapshot::from_swarm(vec![svc]);
        let tmpl = write_template(
            "{% for s in services %}{{ s.name }}{% for e in s.endpoints %} {{ e.hostname }}={{ e.address }}{% endfor %}\n{% endfor %}",
        );
        let out = render(tmpl.path(), &snapshot).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "api api-2=10.0.0.3 api-1=10.0.0.2\n"
        );
    }

    #[test]
    fn parse_error_is_reported_not_panicked() {
        let snapshot = Snapshot::from_swarm(vec![]);
        let tmpl = write_template("{% for s in services %}{{ s.name }");
        let err = render(tmpl.path(), &snapshot).unwrap_err();
        assert!(matches!(err, RenderError::Parse(_) | RenderError::Exec(_)));
    }

    #[test]
    fn missing_source_file_is_an_io_error() {
        let snapshot = Snapshot::from_swarm(vec![]);
        let err = render(std::path::Path::new("/nonexistent/path"), &snapshot).unwrap_err();
        assert!(matches!(err, RenderError::Read(_)));
    }
}
