//! Model — the YAML configuration schema (§6).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_check_interval() -> i64 {
    30
}

fn default_grouping_label() -> String {
    "app".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub debugport: String,
    #[serde(rename = "checkintervall", default = "default_check_interval")]
    pub check_interval_secs: i64,
    pub templates: HashMap<String, TemplateEntry>,
    pub cmd: CmdConfig,
    pub swarm: SwarmConfig,
    pub kubernetes: KubernetesConfig,
    pub coredns: CoreDnsConfig,
    pub pdns: PdnsConfig,
    pub prometheus: PrometheusConfig,
    pub control: ControlConfig,
    pub cron: CronConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateEntry {
    pub src: String,
    pub dst: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CmdConfig {
    pub start: Vec<String>,
    pub reload: Vec<String>,
    pub processname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SwarmConfig {
    pub cacertpem: String,
    pub clientcertpem: String,
    pub clientkeypem: String,
    pub managerurl: String,
    pub usesocket: bool,
    pub networks: Vec<String>,
    /// Operational footgun carried from the original source (§9); must be
    /// opted into explicitly, never hardcoded true.
    pub insecureskipverify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    pub kubeconfig: String,
    pub labelselector: String,
    pub namespace: String,
    pub domainprefix: String,
    pub domainzone: String,
    pub updateazuredns: bool,
    /// Pod label used to bucket pods into template-visible groups.
    /// The original source hardcoded "kbds"; this port defaults to "app"
    /// but accepts the legacy value too.
    pub groupinglabel: String,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            kubeconfig: String::new(),
            labelselector: String::new(),
            namespace: String::new(),
            domainprefix: String::new(),
            domainzone: String::new(),
            updateazuredns: false,
            groupinglabel: default_grouping_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CoreDnsConfig {
    pub arecord: String,
    pub ttl: i64,
    pub path: String,
    pub etcd: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PdnsConfig {
    pub apiurl: String,
    pub apikey: String,
    pub ipaddress: String,
    pub domainprefix: String,
    pub domainzone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PrometheusConfig {
    pub port: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ControlConfig {
    pub port: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CronConfig {
    pub crontab: String,
}

/// Which discovery discipline is active for this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    Swarm,
    Kubernetes,
    None,
}

impl Config {
    pub fn discipline(&self) -> Discipline {
        let swarm = !self.swarm.networks.is_empty();
        let kube = !self.kubernetes.namespace.is_empty();
        match (swarm, kube) {
            (true, false) => Discipline::Swarm,
            (false, true) => Discipline::Kubernetes,
            (false, false) => Discipline::None,
            // Rejected by `validate()` at load time; see DESIGN.md.
            (true, true) => Discipline::None,
        }
    }

    pub fn check_interval(&self) -> std::time::Duration {
        let secs = if self.check_interval_secs <= 0 { 30 } else { self.check_interval_secs };
        std::time::Duration::from_secs(secs as u64)
    }

    pub fn coredns_enabled(&self) -> bool {
        !self.coredns.etcd.is_empty()
    }

    pub fn pdns_enabled(&self) -> bool {
        !self.pdns.apikey.is_empty()
    }

    pub fn prometheus_enabled(&self) -> bool {
        !self.prometheus.port.is_empty()
    }

    pub fn control_enabled(&self) -> bool {
        !self.control.key.is_empty()
    }

    pub fn cron_enabled(&self) -> bool {
        !self.cron.crontab.is_empty()
    }

    pub fn template_pairs(&self) -> Vec<crate::model::TemplatePair> {
        self.templates
            .iter()
            .map(|(name, entry)| crate::model::TemplatePair {
                name: name.clone(),
                src: entry.src.clone().into(),
                dst: entry.dst.clone().into(),
            })
            .collect()
    }
}
