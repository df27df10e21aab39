//! Grammars for workflow request parameters
//!
//! All patterns are anchored at both ends: a value is accepted only when the
//! whole string matches. Character classes are spelled out in ASCII since
//! `\d` and `\w` would also match non-ASCII digits and letters.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Workflow name chosen at submission time
    pub static ref SUBMIT_WORKFLOW_NAME: Regex = Regex::new(r"^[a-zA-Z0-9.\-_]{1,80}$").unwrap();

    /// Workflow name as referenced by later requests
    pub static ref WORKFLOW_NAME: Regex = Regex::new(r"^[a-zA-Z0-9.\-_]{1,100}$").unwrap();

    pub static ref JOB_TYPE: Regex = Regex::new(r"^[A-Za-z]*$").unwrap();

    /// Software release, e.g. CMSSW_5_3_4 or CMSSW_4_2_8_patch1
    pub static ref CMSSW_RELEASE: Regex = Regex::new(r"^CMSSW(_[0-9]+){3}(_[a-zA-Z0-9_]+)?$").unwrap();

    /// SCRAM architecture, e.g. slc5_amd64_gcc462
    pub static ref SCRAM_ARCH: Regex =
        Regex::new(r"^slc[0-9]_[a-z0-9]+_gcc[a-z0-9]+(_[a-z0-9]+)?$").unwrap();

    /// Dataset path `/primary[/processed[/TIER]]`, `*` wildcards allowed
    pub static ref DATASET: Regex = Regex::new(
        r"^/(\*|[a-zA-Z\*][a-zA-Z0-9_\*]{0,100})(/(\*|[a-zA-Z0-9_.\-\*]{1,100}))?(/(\*|[A-Z\-\*]{1,50}))?$"
    ).unwrap();

    /// Site name, e.g. T2_CH_CERN, or a tier wildcard such as T%
    pub static ref SITE: Regex = Regex::new(r"^T[0-3%]((_[A-Z]{2}(_[A-Za-z0-9]+)*)?)$").unwrap();

    /// Comma separated runs and run ranges, e.g. 1,5-10,42
    pub static ref RUN_RANGES: Regex = Regex::new(r"^[0-9]+(-[0-9]+)?(,[0-9]+(-[0-9]+)?)*$").unwrap();

    /// Block name `/primary/processed/TIER#uuid`
    pub static ref BLOCK: Regex =
        Regex::new(r"^(/[a-zA-Z0-9.\-_]{1,100}){3}#[a-zA-Z0-9.\-_]{1,100}$").unwrap();

    pub static ref SPLIT_ALGORITHM: Regex =
        Regex::new(r"^(EventBased|FileBased|LumiBased|RunBased|SizeBased)$").unwrap();

    pub static ref CONFIG_DOC: Regex = Regex::new(r"^[A-Za-z0-9]*$").unwrap();

    /// http(s) URL with optional port, path and query
    pub static ref URL: Regex =
        Regex::new(r"^https?://[-A-Za-z0-9_.]+(:[0-9]+)?(/([A-Za-z0-9_/.]*(\?[!-~]+)?)?)?$").unwrap();

    /// Bare file name, no directories
    pub static ref FILE_NAME: Regex = Regex::new(r"^[a-zA-Z0-9\-._]+$").unwrap();

    pub static ref PUBLISH_NAME: Regex = Regex::new(r"^[a-zA-Z0-9\-_]+$").unwrap();

    pub static ref CAMPAIGN: Regex = Regex::new(r"^[a-zA-Z0-9.\-_]{1,80}$").unwrap();

    pub static ref SUBRESOURCE: Regex =
        Regex::new(r"^(errors|report|logs|data|schema|configcache)$").unwrap();
}
