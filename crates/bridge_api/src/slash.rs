//! Slash-command handling.
//!
//! Everything a user can type after the trigger word lands here: control
//! keywords (`auth`, `status`, `reset`), help, and the
//! `<owner> <repo> <title>` issue-creation form. Validation problems answer
//! with 200 ephemeral guidance rather than HTTP errors, since the chat
//! platform shows error statuses as an opaque failure.

use bridge_core::messages::{self, IssueBodyContext};
use bridge_core::{
    parse_command, ChatContext, CommandError, IssueKey, IssueRequest, NewThreadCorrelation,
    SlashCommand, UserCredential,
};
use chrono::Utc;
use forgejo_client::ForgejoClient;

use crate::errors::ApiError;
use crate::models::{SlashForm, SlashResponse};
use crate::AppState;

#[cfg(test)]
#[path = "slash_tests.rs"]
mod tests;

/// Handle one decoded slash-command request.
///
/// # Errors
///
/// Returns [`ApiError::Authentication`] when a static slash token is
/// configured and the request carries a different one. All other failures
/// resolve to an ephemeral message.
pub async fn handle_slash(state: &AppState, form: &SlashForm) -> Result<SlashResponse, ApiError> {
    if let Some(expected) = &state.config.slash_token {
        if &form.token != expected {
            return Err(ApiError::Authentication(
                "invalid slash command token".to_string(),
            ));
        }
    }

    let ctx = ChatContext {
        user_id: form.user_id.clone(),
        user_name: form.user_name.clone(),
        channel_id: form.channel_id.clone(),
        channel_name: form.channel_name.clone(),
        team_domain: form.team_domain.clone(),
    };

    let command = match parse_command(&form.text) {
        Ok(command) => command,
        Err(CommandError::MissingParameters) => {
            return Ok(SlashResponse::ephemeral(usage_text()));
        }
    };

    match command {
        SlashCommand::Help => Ok(help_response(state, &ctx)?),
        SlashCommand::BeginAuth => Ok(SlashResponse::ephemeral(connect_text(state, &ctx))),
        SlashCommand::Status => Ok(status_response(state, &ctx)?),
        SlashCommand::Reset => Ok(reset_response(state, &ctx)?),
        SlashCommand::CreateIssue(request) => create_issue(state, &ctx, request).await,
    }
}

fn usage_text() -> String {
    "❌ **Missing parameters**\n\n\
     Usage: `/forgejo <owner> <repo> <title>`\n\
     Add further lines for the issue description.\n\n\
     Other commands: `auth`, `status`, `reset`"
        .to_string()
}

fn connect_text(state: &AppState, ctx: &ChatContext) -> String {
    format!(
        "🔗 **Connect your Forgejo account**\n\n\
         [Click here to authorize]({})\n\n\
         After authorizing you can create issues with \
         `/forgejo <owner> <repo> <title>`.",
        state.config.connect_url(&ctx.user_id, &ctx.user_name)
    )
}

fn auth_required_text(state: &AppState, ctx: &ChatContext) -> String {
    format!(
        "🔐 **Authentication required**\n\n\
         You need to connect your Forgejo account first.\n\
         [Click here to authorize]({})",
        state.config.connect_url(&ctx.user_id, &ctx.user_name)
    )
}

fn help_response(state: &AppState, ctx: &ChatContext) -> Result<SlashResponse, ApiError> {
    let connected = match state.tokens.get(&ctx.user_id)? {
        Some(credential) => format!("Connected as **@{}**.", credential.remote_username),
        None => "Not connected. Run `/forgejo auth` to link your account.".to_string(),
    };

    Ok(SlashResponse::ephemeral(format!(
        "**Forgejo bridge**\n\n\
         `/forgejo <owner> <repo> <title>` creates an issue; further lines \
         become the description.\n\
         `/forgejo auth` connects your account, `/forgejo status` shows the \
         connection, `/forgejo reset` clears it.\n\n\
         {connected}"
    )))
}

fn status_response(state: &AppState, ctx: &ChatContext) -> Result<SlashResponse, ApiError> {
    let text = match state.tokens.get(&ctx.user_id)? {
        Some(UserCredential {
            remote_username,
            expires_at: Some(expires_at),
            ..
        }) => format!(
            "✅ Connected to Forgejo as **@{}**.\n\
             Token expires at {}.",
            remote_username,
            expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ),
        Some(UserCredential {
            remote_username, ..
        }) => format!("✅ Connected to Forgejo as **@{remote_username}**."),
        None => format!(
            "❌ Not connected.\n\n{}",
            connect_text(state, ctx)
        ),
    };

    Ok(SlashResponse::ephemeral(text))
}

fn reset_response(state: &AppState, ctx: &ChatContext) -> Result<SlashResponse, ApiError> {
    let removed = state.tokens.delete(&ctx.user_id)?;
    let cleared = if removed {
        "🗑️ Your stored Forgejo session was cleared."
    } else {
        "No stored Forgejo session to clear."
    };

    Ok(SlashResponse::ephemeral(format!(
        "{cleared}\n\n{}",
        connect_text(state, ctx)
    )))
}

async fn create_issue(
    state: &AppState,
    ctx: &ChatContext,
    request: IssueRequest,
) -> Result<SlashResponse, ApiError> {
    let Some(credential) = state.tokens.get(&ctx.user_id)? else {
        return Ok(SlashResponse::ephemeral(auth_required_text(state, ctx)));
    };

    let forge = ForgejoClient::new(&state.config.forgejo_url, &credential.access_token)
        .map_err(|error| ApiError::Internal(error.into()))?;

    if !forge.repo_accessible(&request.owner, &request.repo).await {
        return Ok(SlashResponse::ephemeral(format!(
            "❌ **Repository not accessible**\n\n\
             `{}/{}` does not exist or your Forgejo account cannot see it.",
            request.owner, request.repo
        )));
    }

    let body = messages::issue_body(&IssueBodyContext {
        channel_name: &ctx.channel_name,
        team_domain: &ctx.team_domain,
        chat_username: &ctx.user_name,
        forge_username: &credential.remote_username,
        title: &request.title,
        user_body: request.body.as_deref(),
        created_at: Utc::now(),
    });

    let issue = match forge
        .create_issue(&request.owner, &request.repo, &request.title, &body)
        .await
    {
        Ok(issue) => issue,
        Err(error) => {
            tracing::error!(
                owner = %request.owner,
                repo = %request.repo,
                %error,
                "issue creation failed"
            );
            return Ok(SlashResponse::ephemeral(
                "❌ **Failed to create issue**\n\n\
                 Forgejo rejected the request. Check that the repository \
                 accepts issues and try again, or run `/forgejo reset` to \
                 reconnect your account."
                    .to_string(),
            ));
        }
    };

    let key = IssueKey::new(request.owner.clone(), request.repo.clone(), issue.number)
        .map_err(|error| ApiError::Internal(error.into()))?;

    let confirmation = messages::issue_created_confirmation(
        &request.title,
        &request.owner,
        &request.repo,
        issue.number,
        &issue.html_url,
        &credential.remote_username,
    );

    // Posting through the chat API gives us the post id to thread later
    // notifications under. Failure here degrades to an in_channel slash
    // response; the issue already exists either way.
    let root_message_id = match &state.chat {
        Some(chat) => match chat.create_post(&ctx.channel_id, &confirmation, None).await {
            Ok(post) => Some(post.id),
            Err(error) => {
                tracing::warn!(issue_key = %key, %error, "confirmation post failed");
                None
            }
        },
        None => None,
    };
    let root_posted = root_message_id.is_some();

    if let Err(error) = state.correlations.put(&NewThreadCorrelation {
        issue_key: key.clone(),
        channel_id: ctx.channel_id.clone(),
        username: ctx.user_name.clone(),
        channel_name: ctx.channel_name.clone(),
        team_domain: ctx.team_domain.clone(),
        issue_url: issue.html_url.clone(),
        root_message_id,
    }) {
        tracing::error!(issue_key = %key, %error, "correlation write failed");
    }

    if root_posted {
        Ok(SlashResponse::empty())
    } else {
        Ok(SlashResponse::in_channel(confirmation))
    }
}
