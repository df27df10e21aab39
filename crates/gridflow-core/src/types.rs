use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of the caller, as established by the authenticating front-end
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Distinguished name of the caller's certificate
    pub dn: String,
    /// Login (hypernews) name
    pub login: String,
}

impl UserIdentity {
    /// Create a new identity
    pub fn new(dn: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            login: login.into(),
        }
    }
}

/// Algorithm used to split a workflow into jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitAlgorithm {
    /// Fixed number of events per job
    EventBased,
    /// Fixed number of files per job
    FileBased,
    /// Fixed number of luminosity sections per job
    LumiBased,
    /// One run per job
    RunBased,
    /// Fixed input size per job
    SizeBased,
}

impl SplitAlgorithm {
    /// Wire name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitAlgorithm::EventBased => "EventBased",
            SplitAlgorithm::FileBased => "FileBased",
            SplitAlgorithm::LumiBased => "LumiBased",
            SplitAlgorithm::RunBased => "RunBased",
            SplitAlgorithm::SizeBased => "SizeBased",
        }
    }
}

impl fmt::Display for SplitAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EventBased" => Ok(SplitAlgorithm::EventBased),
            "FileBased" => Ok(SplitAlgorithm::FileBased),
            "LumiBased" => Ok(SplitAlgorithm::LumiBased),
            "RunBased" => Ok(SplitAlgorithm::RunBased),
            "SizeBased" => Ok(SplitAlgorithm::SizeBased),
            other => Err(format!("unknown splitting algorithm '{}'", other)),
        }
    }
}

/// Per-workflow information that can be requested on GET
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subresource {
    /// Job failures
    Errors,
    /// Processing report
    Report,
    /// Job log files
    Logs,
    /// Job output files
    Data,
    /// Submitted request document
    Schema,
    /// Configuration cache document
    Configcache,
}

impl Subresource {
    /// Wire name of the subresource
    pub fn as_str(&self) -> &'static str {
        match self {
            Subresource::Errors => "errors",
            Subresource::Report => "report",
            Subresource::Logs => "logs",
            Subresource::Data => "data",
            Subresource::Schema => "schema",
            Subresource::Configcache => "configcache",
        }
    }
}

impl fmt::Display for Subresource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subresource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "errors" => Ok(Subresource::Errors),
            "report" => Ok(Subresource::Report),
            "logs" => Ok(Subresource::Logs),
            "data" => Ok(Subresource::Data),
            "schema" => Ok(Subresource::Schema),
            "configcache" => Ok(Subresource::Configcache),
            other => Err(format!("unknown subresource '{}'", other)),
        }
    }
}

/// Inclusive range of run numbers, `first-last` or a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRange {
    /// First run in the range
    pub first: u64,
    /// Last run in the range
    pub last: u64,
}

impl RunRange {
    /// Whether `run` falls in this range
    pub fn contains(&self, run: u64) -> bool {
        self.first <= run && run <= self.last
    }
}

impl fmt::Display for RunRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Lifecycle status of a workflow as tracked by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Accepted, not yet processed
    New,
    /// Failed jobs were sent back for processing
    Resubmitted,
    /// Output publication was requested
    Publishing,
    /// Aborted by the owner
    Killed,
}

impl WorkflowStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::New => "NEW",
            WorkflowStatus::Resubmitted => "RESUBMITTED",
            WorkflowStatus::Publishing => "PUBLISHING",
            WorkflowStatus::Killed => "KILLED",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated workflow submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Workflow name requested by the user
    pub workflow: String,
    /// Job type, usually CMSSW
    pub jobtype: String,
    /// Software release
    pub jobsw: String,
    /// Software architecture (SCRAM_ARCH)
    pub jobarch: String,
    /// Input dataset
    pub inputdata: String,
    /// Sites never to run at
    pub siteblacklist: Vec<String>,
    /// Sites to run at exclusively
    pub sitewhitelist: Vec<String>,
    /// Runs to select from the input dataset
    pub runwhitelist: Vec<RunRange>,
    /// Runs to exclude from the input dataset
    pub runblacklist: Vec<RunRange>,
    /// Blocks to select from the input dataset
    pub blockwhitelist: Vec<String>,
    /// Blocks to exclude from the input dataset
    pub blockblacklist: Vec<String>,
    /// Splitting algorithm
    pub splitalgo: SplitAlgorithm,
    /// Argument of the splitting algorithm
    pub algoargs: i64,
    /// Config cache document id
    pub configdoc: String,
    /// URL of the input sandbox
    pub userisburl: String,
    /// Additional input files
    pub adduserfiles: Vec<String>,
    /// Additional output files
    pub addoutputfiles: Vec<String>,
    /// Archive the job logs
    pub savelogsflag: bool,
    /// Name used for data publication
    pub publishname: String,
    /// Storage site for the output
    pub asyncdest: String,
    /// Existing campaign to append the workflow to
    pub campaign: Option<String>,
    /// Exclude Tier-1 sites
    #[serde(rename = "blacklistT1")]
    pub blacklist_t1: bool,
}
