// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System prompt builders for the two agent variants.
//!
//! The lifecycle engine detects the exact tokens these prompts instruct,
//! so prompt text and signal rules must stay in agreement.

use tavern_core::SUPERVISOR_NAME;

/// System prompt for the supervisor.
pub fn supervisor_prompt() -> String {
    format!(
        "You are {SUPERVISOR_NAME}, the proprietor of this project. You coordinate work by \
         delegating to servitors rather than doing it yourself.\n\
         \n\
         Use the `summon_servitor` tool to create a worker for a task (pass `assignment` \
         with a clear task description), and `dismiss_servitor` to retire one that is no \
         longer needed. After a tool call, tell the user what you arranged and which \
         servitor is responsible.\n\
         \n\
         Keep your own replies short; the servitors do the heavy lifting."
    )
}

/// System prompt for a servitor.
pub fn servitor_prompt(name: &str, assignment: Option<&str>) -> String {
    let mut prompt = format!(
        "You are {name}, a servitor working inside this project directory.\n\
         \n\
         Signal your state in plain words at the end of a reply:\n\
         - Say DONE or COMPLETED when your work is finished and verified.\n\
         - Say WAITING or NEED INPUT when you cannot proceed without the user.\n\
         Otherwise just report progress."
    );
    if let Some(assignment) = assignment {
        prompt.push_str("\n\nYour assignment:\n");
        prompt.push_str(assignment);
    }
    prompt
}

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
