//! Core adaptation pipeline shared by library callers and the CLI.
//! No I/O or rendering dependencies.

use crate::adapt::{apply_all, plan, AdaptIssue, EditOperation, RouterConfig};
use crate::geom::{ModelError, Schematic};
use crate::matcher::{compatibility, Compatibility, MatchReport};
use crate::netlist::{InputNetlist, NetlistError};
use crate::templates::Template;

#[derive(Debug, thiserror::Error)]
pub enum AdaptError {
    #[error("netlist error: {0}")]
    Netlist(#[from] NetlistError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("no template is compatible with the target netlist")]
    NoCompatibleTemplate,
}

/// Options for adaptation runs (library or CLI).
#[derive(Clone, Debug)]
pub struct AdaptOptions {
    /// Highest per-box mismatch score a template may carry and still
    /// count as compatible.
    pub max_box_score: u32,
    /// When set, reject targets no template is compatible with instead
    /// of adapting the best-effort minimum-score template.
    pub require_compatible: bool,
    pub router: RouterConfig,
}

impl Default for AdaptOptions {
    fn default() -> Self {
        Self {
            max_box_score: 0,
            require_compatible: false,
            router: RouterConfig::default(),
        }
    }
}

/// The result of adapting one template to a target netlist.
#[derive(Debug, Clone)]
pub struct AdaptOutcome {
    /// Name of the chosen template.
    pub template: String,
    /// The adapted geometric model.
    pub model: Schematic,
    /// The edits applied, in order.
    pub operations: Vec<EditOperation>,
    /// Box correspondence and per-box scores, including rotations.
    pub report: MatchReport,
    /// Non-fatal issues raised while applying the edits.
    pub issues: Vec<AdaptIssue>,
}

impl AdaptOutcome {
    pub fn score(&self) -> u32 {
        self.report.total_score()
    }

    pub fn is_exact(&self) -> bool {
        self.report.is_exact()
    }
}

/// Core adaptation API.
pub struct SchemaFitCore;

impl SchemaFitCore {
    /// Adapt a single template model to `target`. The template is
    /// cloned; the caller's model is left untouched.
    pub fn adapt_model(
        name: &str,
        template: &Schematic,
        target: &InputNetlist,
        options: &AdaptOptions,
    ) -> Result<AdaptOutcome, AdaptError> {
        let edit_plan = plan(template, target)?;
        let mut model = template.clone();
        let issues = apply_all(&mut model, &edit_plan.operations, &options.router)?;
        tracing::debug!(
            template = name,
            operations = edit_plan.operations.len(),
            issues = issues.len(),
            "template adapted"
        );
        Ok(AdaptOutcome {
            template: name.to_string(),
            model,
            operations: edit_plan.operations,
            report: edit_plan.report,
            issues,
        })
    }

    /// Score a template against a target without mutating anything.
    pub fn score_template(
        template: &Schematic,
        target: &InputNetlist,
    ) -> Result<MatchReport, AdaptError> {
        Ok(plan(template, target)?.report)
    }

    /// Full compatibility verdict between a template and a target.
    pub fn check_compatibility(
        template: &Schematic,
        target: &InputNetlist,
        options: &AdaptOptions,
    ) -> Result<Compatibility, AdaptError> {
        let candidate = template.to_netlist();
        Ok(compatibility(&candidate, target, options.max_box_score)?)
    }

    /// Pick the best template from `templates` for `target` and adapt
    /// it. Templates are scored sequentially; the minimum total score
    /// wins, earliest template on ties. Each adaptation works on an
    /// independent copy of the template model.
    pub fn adapt_best(
        templates: &[Template],
        target: &InputNetlist,
        options: &AdaptOptions,
    ) -> Result<AdaptOutcome, AdaptError> {
        let models: Vec<(String, Schematic)> = templates
            .iter()
            .map(|t| (t.name.to_string(), (t.build)()))
            .collect();
        Self::adapt_best_model(&models, target, options)
    }

    /// Like [`adapt_best`](Self::adapt_best), over already-built
    /// models. Used for templates loaded from files.
    pub fn adapt_best_model(
        models: &[(String, Schematic)],
        target: &InputNetlist,
        options: &AdaptOptions,
    ) -> Result<AdaptOutcome, AdaptError> {
        let mut best: Option<(u32, bool, &str, &Schematic)> = None;

        for (name, model) in models {
            let candidate = model.to_netlist();
            let verdict = compatibility(&candidate, target, options.max_box_score)?;
            let score = verdict.report.total_score();
            tracing::debug!(
                template = name.as_str(),
                score,
                compatible = verdict.compatible,
                "template scored"
            );
            // Compatible templates always beat incompatible ones;
            // within a tier, strictly lower score wins.
            let better = match &best {
                None => true,
                Some((s, c, _, _)) => match (verdict.compatible, *c) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => score < *s,
                },
            };
            if better {
                best = Some((score, verdict.compatible, name, model));
            }
        }

        let Some((_, compatible, name, model)) = best else {
            return Err(AdaptError::NoCompatibleTemplate);
        };
        if options.require_compatible && !compatible {
            return Err(AdaptError::NoCompatibleTemplate);
        }
        Self::adapt_model(name, model, target, options)
    }
}
