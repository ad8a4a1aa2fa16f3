//! The bounded continuation loop.
//!
//! One top-level completion call runs this loop: resolve parameters, run
//! the hook chain, send, then either return the reply or dispatch the
//! requested tools and go again. Tool spending is bounded by a budget;
//! exhausting it, or a tool's early-stop signal, forces one last request
//! with tools disabled instead of failing.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::call::{ChatOutcome, CompletionCall, Reply};
use super::extract::extract_json;
use super::ChatSession;
use crate::backend::{BackendReply, BackendRequest};
use crate::error::{ColloquyError, Result};
use crate::hooks::{run_hooks, CompletionContext, ContextMetadata, RequestHook};
use crate::settings::resolve::resolve;
use crate::settings::CompletionSettings;
use crate::tools::{ToolContext, ToolFilter};
use crate::transcript::TranscriptEntry;
use crate::util::backoff::BackoffSchedule;
use crate::wire::TokenUsage;

/// Extra attempts granted when JSON mode receives unusable content.
const JSON_PARSE_RETRIES: u32 = 2;

/// Appended as a system turn when the tool call budget runs out, before
/// the final tools-disabled request.
const BUDGET_NOTICE: &str = "Maximum number of tool calls reached. Answer the user directly now; \
     further tool calls are unavailable.";

/// Tool spending across one top-level call, carried through continuations.
#[derive(Debug, Clone, Copy)]
struct ToolCallBudget {
    used: u32,
    max: u32,
}

impl ToolCallBudget {
    fn new(max: u32) -> Self {
        Self { used: 0, max }
    }

    fn would_exceed(&self, calls: u32) -> bool {
        self.used + calls > self.max
    }

    fn spend(&mut self, calls: u32) {
        self.used += calls;
    }
}

pub(super) async fn run(session: &mut ChatSession, call: CompletionCall) -> Result<ChatOutcome> {
    if call.auto_continue.is_some() {
        warn!("auto_continue is deprecated and has no effect; tool continuation is always automatic");
    }

    let request_id = Uuid::new_v4().to_string();
    let overrides = call_overrides(&call, &session.overrides);
    let hooks = hook_chain(session);
    let backoff = BackoffSchedule::default();
    let capabilities = session.backend.capabilities();

    let mut usage = TokenUsage::default();
    let mut budget_slot: Option<ToolCallBudget> = None;
    let mut forced_final = false;
    let mut json_retries = 0u32;
    let mut attempt = 0u32;
    // The override message list stands in for the transcript until a
    // continuation appends real turns to the store.
    let mut use_override = call.messages_override.is_some();

    loop {
        attempt += 1;
        let filter = if forced_final {
            ToolFilter::Disabled
        } else {
            call.tool_filter.clone()
        };
        let resolved = resolve(
            &overrides,
            &session.scope,
            &session.tools,
            &filter,
            call.json,
            capabilities,
        )?;
        let budget = budget_slot.get_or_insert_with(|| ToolCallBudget::new(resolved.max_tool_calls));

        let messages = if use_override {
            call.messages_override.clone().unwrap_or_default()
        } else {
            session.transcript.to_wire()
        };
        if messages.is_empty() {
            return Err(ColloquyError::EmptyTranscript);
        }

        let metadata = ContextMetadata::new(
            request_id.clone(),
            resolved.model.clone(),
            attempt,
            resolved.json_mode,
        );
        let mut context = CompletionContext::new(messages, resolved.params, metadata.clone());
        run_hooks(&hooks, &mut context).await;

        let request = BackendRequest {
            model: resolved.model.clone(),
            messages: context.messages,
            params: context.params,
        };
        debug!(request_id = %request_id, attempt, model = %resolved.model, "sending chat completion");

        let response = match session.backend.send(request).await? {
            BackendReply::Streamed(stream) => {
                debug!(request_id = %request_id, "backend streamed; returning the handle untouched");
                return Ok(ChatOutcome {
                    reply: Reply::Streamed(stream),
                    response: None,
                    usage,
                });
            }
            BackendReply::Complete(response) => response,
        };
        if let Some(response_usage) = &response.usage {
            usage.merge(response_usage);
        }

        let content = response.content().to_string();
        let calls = response.tool_calls().to_vec();

        if !calls.is_empty() && !forced_final {
            let requested = calls.len() as u32;
            if budget.would_exceed(requested) {
                warn!(
                    request_id = %request_id,
                    used = budget.used,
                    max = budget.max,
                    requested,
                    "tool call budget exhausted; forcing a final reply"
                );
                session.transcript.push(TranscriptEntry::system(BUDGET_NOTICE));
                use_override = false;
                forced_final = true;
                continue;
            }

            session
                .transcript
                .push(TranscriptEntry::assistant_with_calls(content, calls.clone()));
            use_override = false;

            let tool_context = ToolContext::new(metadata);
            for tool_call in &calls {
                let entry = session.tools.dispatch(tool_call, &tool_context).await?;
                session.transcript.push(entry);
                budget.spend(1);
            }
            session.transcript.extend(tool_context.drain_transcript());

            if tool_context.stop_requested() {
                debug!(request_id = %request_id, "tool requested an early stop");
                forced_final = true;
                continue;
            }
            // A tool may have written the closing assistant turn itself;
            // return it instead of asking the model again.
            if let Some(text) = session
                .transcript
                .last()
                .and_then(TranscriptEntry::assistant_text)
            {
                debug!(request_id = %request_id, "a tool wrote the closing assistant turn");
                let text = text.trim().to_string();
                let reply = if resolved.json_mode && !call.raw {
                    match extract_json(&text) {
                        Some(value) => Reply::Json(value),
                        None => {
                            return Err(ColloquyError::ResponseParse(
                                "closing assistant turn is not parseable JSON".to_string(),
                            ));
                        }
                    }
                } else {
                    Reply::Text(text)
                };
                return Ok(ChatOutcome {
                    reply,
                    response: Some(response),
                    usage,
                });
            }
            continue;
        }

        if forced_final && !calls.is_empty() {
            warn!(request_id = %request_id, "model requested tools in a final-reply turn; ignoring them");
        }

        let trimmed = content.trim().to_string();

        if resolved.json_mode && !call.raw {
            match extract_json(&content) {
                Some(value) => {
                    if call.save_response && !trimmed.is_empty() {
                        session.transcript.push(TranscriptEntry::assistant(trimmed));
                    }
                    return Ok(ChatOutcome {
                        reply: Reply::Json(value),
                        response: Some(response),
                        usage,
                    });
                }
                None => {
                    if json_retries < JSON_PARSE_RETRIES {
                        json_retries += 1;
                        debug!(
                            request_id = %request_id,
                            retry = json_retries,
                            "reply is not parseable JSON; retrying"
                        );
                        tokio::time::sleep(backoff.delay(json_retries)).await;
                        continue;
                    }
                    return Err(ColloquyError::ResponseParse(format!(
                        "no parseable JSON content after {} attempts",
                        JSON_PARSE_RETRIES + 1
                    )));
                }
            }
        }

        if call.save_response && !trimmed.is_empty() {
            session
                .transcript
                .push(TranscriptEntry::assistant(trimmed.clone()));
        }
        let reply = if call.raw {
            Reply::Raw(response.clone())
        } else {
            Reply::Text(trimmed)
        };
        return Ok(ChatOutcome {
            reply,
            response: Some(response),
            usage,
        });
    }
}

/// Fold the call's own overrides over the session's, with the explicit
/// model and budget shorthands winning over `params`.
fn call_overrides(call: &CompletionCall, session_overrides: &CompletionSettings) -> CompletionSettings {
    let mut top = call.params.clone().unwrap_or_default();
    if let Some(model) = &call.model {
        if !model.is_empty() {
            top.model = Some(model.clone());
        }
    }
    if let Some(max) = call.max_tool_calls {
        top.max_tool_calls = Some(max);
    }
    top.with_fallback(session_overrides)
}

/// Hooks in execution order: the scope chain root-first, then the
/// session's own hook.
fn hook_chain(session: &ChatSession) -> Vec<Arc<dyn RequestHook>> {
    let mut hooks = session.scope.chain_hooks();
    if let Some(hook) = &session.hook {
        hooks.push(Arc::clone(hook));
    }
    hooks
}
