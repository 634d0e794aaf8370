//! Built-in scenarios against a real Slack workspace.
//!
//! They read the workspace URL and credentials from the `workspace_url`,
//! `user_email` and `user_pwd` flags.

use super::scenario::Scenario;
use futures::FutureExt;

pub fn scenarios() -> Vec<Scenario> {
    vec![
        sign_in_page(),
        sign_in(),
        save_message(),
        search_message(),
    ]
}

fn sign_in_page() -> Scenario {
    Scenario::new("Sign in page is displayed for the workspace")
        .tag("@login")
        .step("I am on the page with URL provided by flag \"workspace_url\"", |w| {
            w.open_page_from_flag("workspace_url").boxed()
        })
        .step("I fill in \"Email address\" with value provided by flag \"user_email\"", |w| {
            w.fill_in_from_flag("Email address", "user_email").boxed()
        })
        .step("I fill in \"Password\" with value provided by flag \"user_pwd\"", |w| {
            w.fill_in_from_flag("Password", "user_pwd").boxed()
        })
}

fn sign_in() -> Scenario {
    Scenario::new("Sign in and open the general channel")
        .tag("@smoke")
        .tag("@login")
        .step("I sign in the workspace at URL provided by flag \"workspace_url\"", |w| {
            w.sign_in_from_flag("workspace_url").boxed()
        })
        .step("I select sidebar item \"general\"", |w| {
            w.select_sidebar_item("general").boxed()
        })
        .step("I am in \"general\" channel", |w| {
            w.check_selected_channel("general").boxed()
        })
}

fn save_message() -> Scenario {
    Scenario::new("Save a message and remove it from Saved items")
        .tag("@messages")
        .step("I sign in the workspace at URL provided by flag \"workspace_url\"", |w| {
            w.sign_in_from_flag("workspace_url").boxed()
        })
        .step("I select sidebar item \"general\"", |w| {
            w.select_sidebar_item("general").boxed()
        })
        .step("I send my local time", |w| w.send_local_time().boxed())
        .step("I save the last message", |w| w.save_last_message().boxed())
        .step("I select sidebar item \"Saved items\"", |w| {
            w.select_sidebar_item("Saved items").boxed()
        })
        .step("I see Saved items pane on the right", |w| {
            w.saved_items_pane_displayed().boxed()
        })
        .step("the last message appears in Saved items", |w| {
            w.last_message_in_saved_items().boxed()
        })
        .step("I remove the last message from Saved items", |w| {
            w.remove_last_message_from_saved_items().boxed()
        })
}

fn search_message() -> Scenario {
    Scenario::new("Find a sent message through search")
        .tag("@messages")
        .tag("@search")
        .step("I sign in the workspace at URL provided by flag \"workspace_url\"", |w| {
            w.sign_in_from_flag("workspace_url").boxed()
        })
        .step("I select sidebar item \"general\"", |w| {
            w.select_sidebar_item("general").boxed()
        })
        .step("I send my local time", |w| w.send_local_time().boxed())
        .step("I search for \"My local time is\"", |w| {
            w.search_for("My local time is").boxed()
        })
        .step("the last message appears in search results", |w| {
            w.last_message_in_search_results().boxed()
        })
        .step("I close top search popup window", |w| {
            w.close_top_search_popup().boxed()
        })
}
