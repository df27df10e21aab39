//! Validation of the workflow resource, per HTTP method

use gridflow_core::{RunRange, SplitAlgorithm, SubmitRequest, Subresource};
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::grammar;
use crate::params::{RawParams, SafeParams};
use crate::rules::{validate_num, validate_str, validate_strlist, NumBounds};

/// POST: modify an existing workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    /// Workflow to modify
    pub workflow: String,
    /// Non-zero to resubmit the failed jobs
    pub resubmit: Option<i64>,
    /// DBS instance to publish the output to
    pub dbsurl: Option<String>,
}

impl ModifyRequest {
    /// Whether a resubmission was asked for
    pub fn wants_resubmit(&self) -> bool {
        self.resubmit.unwrap_or(0) != 0
    }
}

/// GET: query workflows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Workflows to query; empty means the caller's latest workflows
    pub workflows: Vec<String>,
    /// Specific information to return instead of the status summary
    pub subresource: Option<Subresource>,
    /// Look-back window in days for the latest workflows
    pub age: Option<i64>,
    /// Maximum number of entries returned
    pub limit: Option<i64>,
    /// Non-zero for the condensed error listing
    pub shortformat: Option<i64>,
}

/// DELETE: abort workflows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortRequest {
    /// Workflows to abort
    pub workflows: Vec<String>,
    /// Non-zero to kill regardless of the current state
    pub force: Option<i64>,
}

/// A validated call on the workflow resource
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowCall {
    /// PUT
    Submit(SubmitRequest),
    /// POST
    Modify(ModifyRequest),
    /// GET
    Query(QueryRequest),
    /// DELETE
    Abort(AbortRequest),
}

/// Validate the parameters of a call, dispatching on the HTTP method name
pub fn validate_request(method: &str, raw: RawParams) -> ValidationResult<WorkflowCall> {
    match method {
        "PUT" => validate_put(raw).map(WorkflowCall::Submit),
        "POST" => validate_post(raw).map(WorkflowCall::Modify),
        "GET" => validate_get(raw).map(WorkflowCall::Query),
        "DELETE" => validate_delete(raw).map(WorkflowCall::Abort),
        other => Err(ValidationError::UnsupportedMethod(other.to_string())),
    }
}

/// Validate a workflow submission
pub fn validate_put(mut raw: RawParams) -> ValidationResult<SubmitRequest> {
    let mut safe = SafeParams::new();
    let p = &mut raw;
    let s = &mut safe;

    validate_str("workflow", p, s, &grammar::SUBMIT_WORKFLOW_NAME, false)?;
    validate_str("jobtype", p, s, &grammar::JOB_TYPE, false)?;
    validate_str("jobsw", p, s, &grammar::CMSSW_RELEASE, false)?;
    validate_str("jobarch", p, s, &grammar::SCRAM_ARCH, false)?;
    validate_str("inputdata", p, s, &grammar::DATASET, false)?;
    validate_strlist("siteblacklist", p, s, &grammar::SITE)?;
    validate_strlist("sitewhitelist", p, s, &grammar::SITE)?;
    validate_str("runwhitelist", p, s, &grammar::RUN_RANGES, true)?;
    validate_str("runblacklist", p, s, &grammar::RUN_RANGES, true)?;
    validate_strlist("blockwhitelist", p, s, &grammar::BLOCK)?;
    validate_strlist("blockblacklist", p, s, &grammar::BLOCK)?;
    validate_str("splitalgo", p, s, &grammar::SPLIT_ALGORITHM, false)?;
    validate_num("algoargs", p, s, false, NumBounds::NONE)?;
    validate_str("configdoc", p, s, &grammar::CONFIG_DOC, false)?;
    validate_str("userisburl", p, s, &grammar::URL, false)?;
    validate_strlist("adduserfiles", p, s, &grammar::FILE_NAME)?;
    validate_strlist("addoutputfiles", p, s, &grammar::FILE_NAME)?;
    validate_num("savelogsflag", p, s, false, NumBounds::NONE)?;
    validate_str("publishname", p, s, &grammar::PUBLISH_NAME, false)?;
    validate_str("asyncdest", p, s, &grammar::SITE, false)?;
    validate_str("campaign", p, s, &grammar::CAMPAIGN, true)?;
    validate_num("blacklistT1", p, s, false, NumBounds::NONE)?;
    reject_excess(&raw)?;

    let splitalgo = safe.require_str("splitalgo")?;
    let splitalgo: SplitAlgorithm = splitalgo
        .parse()
        .map_err(|e: String| ValidationError::invalid("splitalgo", e))?;

    let runwhitelist = match safe.take_str("runwhitelist") {
        Some(ranges) => parse_run_ranges("runwhitelist", &ranges)?,
        None => Vec::new(),
    };
    let runblacklist = match safe.take_str("runblacklist") {
        Some(ranges) => parse_run_ranges("runblacklist", &ranges)?,
        None => Vec::new(),
    };

    Ok(SubmitRequest {
        workflow: safe.require_str("workflow")?,
        jobtype: safe.require_str("jobtype")?,
        jobsw: safe.require_str("jobsw")?,
        jobarch: safe.require_str("jobarch")?,
        inputdata: safe.require_str("inputdata")?,
        siteblacklist: safe.take_str_list("siteblacklist"),
        sitewhitelist: safe.take_str_list("sitewhitelist"),
        runwhitelist,
        runblacklist,
        blockwhitelist: safe.take_str_list("blockwhitelist"),
        blockblacklist: safe.take_str_list("blockblacklist"),
        splitalgo,
        algoargs: safe.require_num("algoargs")?,
        configdoc: safe.require_str("configdoc")?,
        userisburl: safe.require_str("userisburl")?,
        adduserfiles: safe.take_str_list("adduserfiles"),
        addoutputfiles: safe.take_str_list("addoutputfiles"),
        savelogsflag: safe.require_num("savelogsflag")? != 0,
        publishname: safe.require_str("publishname")?,
        asyncdest: safe.require_str("asyncdest")?,
        campaign: safe.take_str("campaign"),
        blacklist_t1: safe.require_num("blacklistT1")? != 0,
    })
}

/// Validate a modification of an existing workflow
pub fn validate_post(mut raw: RawParams) -> ValidationResult<ModifyRequest> {
    let mut safe = SafeParams::new();

    validate_str("workflow", &mut raw, &mut safe, &grammar::WORKFLOW_NAME, false)?;
    validate_num("resubmit", &mut raw, &mut safe, true, NumBounds::NONE)?;
    validate_str("dbsurl", &mut raw, &mut safe, &grammar::URL, true)?;
    reject_excess(&raw)?;

    Ok(ModifyRequest {
        workflow: safe.require_str("workflow")?,
        resubmit: safe.take_num("resubmit"),
        dbsurl: safe.take_str("dbsurl"),
    })
}

/// Validate a workflow query
pub fn validate_get(mut raw: RawParams) -> ValidationResult<QueryRequest> {
    let mut safe = SafeParams::new();

    validate_strlist("workflow", &mut raw, &mut safe, &grammar::WORKFLOW_NAME)?;
    validate_str("subresource", &mut raw, &mut safe, &grammar::SUBRESOURCE, true)?;
    validate_num("age", &mut raw, &mut safe, true, NumBounds::NON_NEGATIVE)?;
    validate_num("limit", &mut raw, &mut safe, true, NumBounds::NON_NEGATIVE)?;
    validate_num("shortformat", &mut raw, &mut safe, true, NumBounds::NONE)?;
    reject_excess(&raw)?;

    let subresource = safe
        .take_str("subresource")
        .map(|name| {
            name.parse::<Subresource>()
                .map_err(|e| ValidationError::invalid("subresource", e))
        })
        .transpose()?;

    Ok(QueryRequest {
        workflows: safe.take_str_list("workflow"),
        subresource,
        age: safe.take_num("age"),
        limit: safe.take_num("limit"),
        shortformat: safe.take_num("shortformat"),
    })
}

/// Validate a workflow abort
pub fn validate_delete(mut raw: RawParams) -> ValidationResult<AbortRequest> {
    let mut safe = SafeParams::new();

    validate_strlist("workflow", &mut raw, &mut safe, &grammar::WORKFLOW_NAME)?;
    validate_num("force", &mut raw, &mut safe, true, NumBounds::NONE)?;
    reject_excess(&raw)?;

    Ok(AbortRequest {
        workflows: safe.take_str_list("workflow"),
        force: safe.take_num("force"),
    })
}

fn reject_excess(raw: &RawParams) -> ValidationResult<()> {
    if raw.is_empty() {
        return Ok(());
    }
    let names = raw.remaining();
    debug!(?names, "Rejecting unexpected parameters");
    Err(ValidationError::ExcessArguments(names))
}

/// Parse `1,5-10` into run ranges; the grammar has already been checked
fn parse_run_ranges(name: &str, value: &str) -> ValidationResult<Vec<RunRange>> {
    value
        .split(',')
        .map(|item| {
            let (first, last) = match item.split_once('-') {
                Some((first, last)) => (first, last),
                None => (item, item),
            };
            let first: u64 = first
                .parse()
                .map_err(|_| ValidationError::invalid(name, format!("run number '{}' is too large", first)))?;
            let last: u64 = last
                .parse()
                .map_err(|_| ValidationError::invalid(name, format!("run number '{}' is too large", last)))?;
            if first > last {
                return Err(ValidationError::invalid(name, format!("empty run range '{}'", item)));
            }
            Ok(RunRange { first, last })
        })
        .collect()
}
