//! Main application state and logic
//!
//! The App struct implements the Component trait, acting as the root component
//! that owns the dataset, the current location and everything the table reports
//! back: committed filter values, the selection and the fetched page.

use crate::action::Action;
use crate::component::Component;
use crate::components::action_menu::RowAction;
use crate::components::confirm_dialog::ConfirmDialog;
use crate::components::data_table::{DataTable, TableOptions, TableProps};
use crate::components::help_dialog::HelpDialog;
use crate::components::layout::calculate_app_layout;
use crate::components::record_dialog::RecordDialog;
use crate::config::Config;
use crate::export::ExportConfig;
use crate::model::account::{Account, AccountStatus};
use crate::model::column::Column;
use crate::model::event::TableEvent;
use crate::model::filter::{FilterDescriptor, FilterOption, FilterValues};
use crate::model::modal::{Modal, ModalStack};
use crate::model::pagination::Location;
use crate::model::selection::Selection;
use crate::model::sort::SortMode;
use crate::services::dataset;
use crate::services::query::{
    self, QueryResult, CREATED_KEY, PLAN_KEY, SEARCH_KEY, STATUS_KEY,
};
use crate::services::query_runner::QueryRunner;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Visited locations kept for back/forward
const HISTORY_LIMIT: usize = 50;

const PLANS: [&str; 3] = ["free", "pro", "enterprise"];

pub struct App {
    pub should_quit: bool,
    config: Config,

    // Data
    accounts: Arc<Vec<Account>>,
    page: Option<QueryResult>,
    runner: QueryRunner,

    // Location & history
    location: Location,
    back: Vec<Location>,
    forward: Vec<Location>,

    // State reported by the table
    filter_values: FilterValues,
    selection: Selection,

    // UI
    table: DataTable<Account>,
    modals: ModalStack,
    help_dialog: HelpDialog,
    record_dialog: Option<RecordDialog>,
    status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, accounts: Vec<Account>, location: Location) -> App {
        let table = account_table(&config);
        let runner = QueryRunner::new(config.simulated_latency_ms);
        let mut app = App {
            should_quit: false,
            config,
            accounts: Arc::new(accounts),
            page: None,
            runner,
            location,
            back: Vec::new(),
            forward: Vec::new(),
            filter_values: FilterValues::new(),
            selection: Selection::new(),
            table,
            modals: ModalStack::new(),
            help_dialog: HelpDialog::default(),
            record_dialog: None,
            status_message: None,
        };
        app.location_changed();
        app
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Location & Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Visit `location`, recording the current one for `HistoryBack`
    ///
    /// Visiting the current location re-runs its query.
    fn navigate(&mut self, location: Location) {
        if location == self.location {
            self.reload();
            return;
        }
        log::info!("navigate {} -> {}", self.location, location);
        let previous = std::mem::replace(&mut self.location, location);
        self.back.push(previous);
        if self.back.len() > HISTORY_LIMIT {
            self.back.remove(0);
        }
        self.forward.clear();
        self.location_changed();
    }

    fn history_step(&mut self, backward: bool) {
        let (from, to) = if backward {
            (&mut self.back, &mut self.forward)
        } else {
            (&mut self.forward, &mut self.back)
        };
        let Some(location) = from.pop() else {
            return;
        };
        to.push(std::mem::replace(&mut self.location, location));
        self.location_changed();
    }

    /// Re-derive committed state from the location and fetch its page
    fn location_changed(&mut self) {
        self.filter_values = query::filter_values(&self.location);
        self.table.set_sort(query::sort_of(&self.location));
        self.reload();
    }

    fn reload(&mut self) {
        self.runner
            .spawn(self.accounts.clone(), &self.location, self.config.page_size);
    }

    fn poll_query(&mut self) {
        if let Some(result) = self.runner.poll() {
            self.page = Some(result);
        }
    }

    /// Block until the running query lands
    #[cfg(test)]
    fn finish_query(&mut self) {
        if let Some(result) = self.runner.wait() {
            self.page = Some(result);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Table
    // ─────────────────────────────────────────────────────────────────────────

    fn table_dispatch(&mut self, action: Action) -> Result<()> {
        let rows = self.page.as_ref().map(|p| p.rows.as_slice()).unwrap_or(&[]);
        let mut props = TableProps::new(rows, &self.filter_values, &self.selection)
            .loading(self.runner.is_loading());
        if let Some(page) = &self.page {
            props = props.paginated(page.pagination, &self.location);
        }

        let events = self.table.dispatch(action, &props, Instant::now());
        for event in events {
            self.handle_table_event(event)?;
        }
        Ok(())
    }

    fn handle_table_event(&mut self, event: TableEvent) -> Result<()> {
        match event {
            TableEvent::FilterChanged { key, value } => self.filter_values.set(key, value),
            TableEvent::FiltersSubmitted => {
                self.navigate(query::with_filters(&self.location, &self.filter_values));
            }
            TableEvent::FiltersCleared => {
                self.status_message = Some("Filters cleared".to_string());
            }
            TableEvent::PageChanged(location) | TableEvent::PageSizeChanged(location) => {
                self.navigate(location);
            }
            TableEvent::SortChanged(sort) => {
                self.navigate(query::with_sort(&self.location, sort.as_ref()));
            }
            TableEvent::SelectionChanged(selection) => self.selection = selection,
            TableEvent::RowClicked { key, .. } => self.open_record(&key)?,
            TableEvent::ActionInvoked { action, key, .. } => self.invoke_row_action(&action, &key)?,
            // The table shows export results in its toolbar
            TableEvent::Exported { path, rows } => {
                log::info!("exported {} accounts to {}", rows, path.display());
            }
            TableEvent::ExportFailed(_) => {}
        }
        Ok(())
    }

    fn find_account(&self, key: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == key)
    }

    fn open_record(&mut self, key: &str) -> Result<()> {
        self.record_dialog = Some(match self.find_account(key) {
            Some(account) => RecordDialog::new(&account.name, account)?,
            None => RecordDialog::missing(key),
        });
        self.modals.push(Modal::RecordDetail {
            key: key.to_string(),
        });
        Ok(())
    }

    fn invoke_row_action(&mut self, action: &str, key: &str) -> Result<()> {
        match action {
            "view" => self.open_record(key)?,
            "close" => {
                let name = self.find_account(key).map_or(key, |a| a.name.as_str());
                let prompt = format!("Close {}? This cannot be undone.", name);
                self.modals.push(Modal::ConfirmAction {
                    action: action.to_string(),
                    key: key.to_string(),
                    prompt,
                });
            }
            _ => self.apply_row_action(action, key),
        }
        Ok(())
    }

    /// Change the status of account `key` and refresh the page
    fn apply_row_action(&mut self, action: &str, key: &str) {
        let status = match action {
            "suspend" => AccountStatus::Suspended,
            "reactivate" => AccountStatus::Active,
            "close" => AccountStatus::Closed,
            other => {
                log::warn!("unknown row action '{}'", other);
                return;
            }
        };

        let accounts = Arc::make_mut(&mut self.accounts);
        let Some(account) = accounts.iter_mut().find(|a| a.id == key) else {
            self.status_message = Some(format!("Account {} no longer exists", key));
            return;
        };
        account.status = status;
        log::info!("account {} is now {}", key, status.as_str());
        self.status_message = Some(format!("{} is now {}", account.name, status.as_str()));

        if let Some(path) = &self.config.dataset_path {
            if let Err(err) = dataset::save_csv(Path::new(path), &self.accounts) {
                log::error!("failed to save dataset: {:#}", err);
                self.status_message = Some(format!("Failed to save dataset: {}", err));
            }
        }
        self.reload();
    }

    fn confirm(&mut self) -> Option<Action> {
        match self.modals.pop()? {
            Modal::QuitConfirm => Some(Action::ForceQuit),
            Modal::ConfirmAction { action, key, .. } => {
                self.apply_row_action(&action, &key);
                None
            }
            other => {
                // Not a confirmation; leave it open
                self.modals.push(other);
                None
            }
        }
    }

    fn sync_help_scroll(&mut self) {
        if let Some(Modal::Help { scroll_offset }) = self.modals.top_mut() {
            *scroll_offset = self.help_dialog.scroll_offset;
        }
    }
}

impl Component for App {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return self.handle_modal_key_event(&modal, key);
        }
        if self.table.captures_input() {
            return self.table.handle_key_event(key);
        }

        let action = match key.code {
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('r') => Some(Action::Reload),
            KeyCode::Char('[') => Some(Action::HistoryBack),
            KeyCode::Char(']') => Some(Action::HistoryForward),
            _ => return self.table.handle_key_event(key),
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if !self.modals.is_empty() {
            return Ok(None);
        }
        self.table.handle_mouse_event(mouse)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                self.poll_query();
                self.table_dispatch(Action::Tick)?;
            }
            Action::ForceQuit => {
                self.table.unmount();
                self.should_quit = true;
            }
            Action::Reload => self.reload(),
            Action::HistoryBack => self.history_step(true),
            Action::HistoryForward => self.history_step(false),

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => self.modals.push(Modal::QuitConfirm),
            Action::OpenHelp => {
                self.help_dialog = HelpDialog::new(0);
                self.modals.push(Modal::Help { scroll_offset: 0 });
            }
            Action::CloseModal => {
                if let Some(Modal::RecordDetail { .. }) = self.modals.pop() {
                    self.record_dialog = None;
                }
            }
            Action::ConfirmModal => return Ok(self.confirm()),
            Action::ModalUp | Action::ModalDown => {
                self.help_dialog.update(action)?;
                self.sync_help_scroll();
            }

            // ─────────────────────────────────────────────────────────────────
            // Everything else belongs to the table
            // ─────────────────────────────────────────────────────────────────
            other => self.table_dispatch(other)?,
        }

        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let layout = calculate_app_layout(area);
        self.draw_header(frame, layout.header);

        let rows = self.page.as_ref().map(|p| p.rows.as_slice()).unwrap_or(&[]);
        let mut props = TableProps::new(rows, &self.filter_values, &self.selection)
            .loading(self.runner.is_loading());
        if let Some(page) = &self.page {
            props = props.paginated(page.pagination, &self.location);
        }
        self.table.render(frame, layout.table, &props);

        self.draw_help_bar(frame, layout.help);

        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => ConfirmDialog::quit().handle_key_event(key),
            Modal::ConfirmAction { prompt, .. } => {
                ConfirmDialog::new("Confirm", prompt.clone()).handle_key_event(key)
            }
            Modal::Help { .. } => self.help_dialog.handle_key_event(key),
            Modal::RecordDetail { .. } => match self.record_dialog.as_mut() {
                Some(dialog) => dialog.handle_key_event(key),
                None => Ok(Some(Action::CloseModal)),
            },
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => ConfirmDialog::quit().draw(frame, area)?,
            Modal::ConfirmAction { prompt, .. } => {
                ConfirmDialog::new("Confirm", prompt.clone())
                    .destructive()
                    .draw(frame, area)?;
            }
            Modal::Help { scroll_offset } => {
                self.help_dialog.scroll_offset = *scroll_offset;
                self.help_dialog.draw(frame, area)?;
                // Drawing clamps the offset
                self.sync_help_scroll();
            }
            Modal::RecordDetail { .. } => {
                if let Some(dialog) = self.record_dialog.as_mut() {
                    dialog.draw(frame, area)?;
                }
            }
        }
        Ok(())
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                " datagrid ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(self.location.to_string(), Style::default().fg(Color::White)),
        ];
        if self.runner.is_loading() {
            spans.push(Span::styled("  ⟳ loading", Style::default().fg(Color::Yellow)));
        }
        if let Some(status) = &self.status_message {
            spans.push(Span::styled(
                format!("  {}", status),
                Style::default().fg(Color::Green),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_help_bar(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let hints = [
            ("/", "search"),
            ("f", "filters"),
            ("s", "sort"),
            ("Space", "select"),
            ("x", "export"),
            ("m", "actions"),
            ("[ ]", "history"),
            ("?", "help"),
            ("q", "quit"),
        ];
        let spans: Vec<Span> = hints
            .iter()
            .flat_map(|(k, label)| {
                [
                    Span::styled(format!(" {} ", k), key),
                    Span::styled(format!("{} ", label), Style::default().fg(Color::DarkGray)),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account table definition
// ─────────────────────────────────────────────────────────────────────────────

fn title_case(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn status_color(status: AccountStatus) -> Color {
    match status {
        AccountStatus::Active => Color::Green,
        AccountStatus::Suspended => Color::Yellow,
        AccountStatus::Closed => Color::DarkGray,
    }
}

fn account_columns() -> Vec<Column<Account>> {
    vec![
        Column::new("name", "Name").width(20).sortable(),
        Column::new("email", "Email").width(26),
        Column::new("status", "Status")
            .width(11)
            .sortable()
            .render(|a: &Account, _| {
                Line::from(Span::styled(
                    format!("{} {}", a.status_icon(), title_case(a.status.as_str())),
                    Style::default().fg(status_color(a.status)),
                ))
            }),
        Column::new("plan", "Plan").width(10).sortable(),
        Column::new("created", "Created").width(10).sortable(),
        Column::new("balance", "Balance")
            .width(10)
            .sortable()
            .render(|a: &Account, _| Line::from(format!("{:>10.2}", a.balance)))
            .export_value(|a: &Account| json!((a.balance * 100.0).round() / 100.0)),
        Column::new("reports", "Reports").width(7).sortable(),
    ]
}

fn account_filters() -> Vec<FilterDescriptor> {
    let statuses = AccountStatus::all()
        .iter()
        .map(|s| FilterOption::new(s.as_str(), title_case(s.as_str())))
        .collect();
    let plans = PLANS
        .iter()
        .map(|p| FilterOption::new(*p, title_case(p)))
        .collect();

    vec![
        FilterDescriptor::text(SEARCH_KEY).with_placeholder("Search accounts"),
        FilterDescriptor::select(STATUS_KEY, statuses).with_label("Status"),
        FilterDescriptor::select(PLAN_KEY, plans).with_label("Plan"),
        FilterDescriptor::date_range(CREATED_KEY).with_label("Created"),
    ]
}

fn account_actions() -> Vec<RowAction<Account>> {
    vec![
        RowAction::new("view", "View details"),
        RowAction::new("suspend", "Suspend")
            .visible_when(|a: &Account| a.status == AccountStatus::Active),
        RowAction::new("reactivate", "Reactivate")
            .visible_when(|a: &Account| a.status == AccountStatus::Suspended),
        RowAction::new("close", "Close account")
            .destructive()
            .visible_when(|a: &Account| a.status != AccountStatus::Closed),
    ]
}

fn account_table(config: &Config) -> DataTable<Account> {
    let options = TableOptions {
        title: "Accounts".to_string(),
        sort_mode: SortMode::Remote,
        debounce_ms: config.debounce_ms,
        page_size_options: config.page_size_options.clone(),
        empty_message: "No accounts match these filters".to_string(),
        export: Some(
            ExportConfig::new("accounts")
                .sheet_name("Accounts")
                .directory(&config.export_dir),
        ),
        ..TableOptions::default()
    };

    DataTable::new(account_columns(), |a: &Account| a.id.clone(), options)
        .filters(account_filters())
        .actions(account_actions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dataset::{sample_accounts, SAMPLE_SIZE};
    use pretty_assertions::assert_eq;

    fn app_at(location: &str) -> App {
        let config = Config {
            debounce_ms: 0,
            ..Config::default()
        };
        let mut app = App::new(config, sample_accounts(), location.parse().unwrap());
        app.finish_query();
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        let action = app.handle_key_event(KeyEvent::from(code)).unwrap();
        let mut next = action;
        while let Some(action) = next {
            next = app.update(action).unwrap();
        }
    }

    fn page_ids(app: &App) -> Vec<String> {
        app.page
            .as_ref()
            .map(|p| p.rows.iter().map(|a| a.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_first_page_loads_on_start() {
        let app = app_at("/accounts");
        let page = app.page.as_ref().unwrap();
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.pagination.total, SAMPLE_SIZE);
    }

    #[test]
    fn test_next_page_navigates_and_history_returns() {
        let mut app = app_at("/accounts");
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.location().page(), 2);
        app.finish_query();
        assert_eq!(page_ids(&app)[0], "acc-011");

        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.location().page(), 1);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.location().page(), 2);
    }

    #[test]
    fn test_search_submit_writes_location() {
        let mut app = app_at("/accounts?page=3");
        press(&mut app, KeyCode::Char('/'));
        for c in "globex".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.location().param(SEARCH_KEY), Some("globex"));
        assert_eq!(app.location().page(), 1);
        app.finish_query();
        assert!(app
            .page
            .as_ref()
            .unwrap()
            .rows
            .iter()
            .all(|a| a.name.starts_with("Globex")));
    }

    #[test]
    fn test_typing_q_in_search_is_not_quit() {
        let mut app = app_at("/accounts");
        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Char('q'));
        assert!(app.modals.is_empty());
        assert_eq!(app.table.search_value(), "q");
    }

    #[test]
    fn test_quit_needs_confirmation() {
        let mut app = app_at("/accounts");
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.modals.top(), Some(&Modal::QuitConfirm));
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_tears_down_the_table() {
        let mut app = app_at("/accounts");
        press(&mut app, KeyCode::Char('f'));
        assert!(app.table.open_overlay().is_some());

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let action = app.handle_key_event(ctrl_c).unwrap().unwrap();
        app.update(action).unwrap();
        assert!(app.should_quit);
        assert!(app.table.open_overlay().is_none());
        assert!(!app.table.captures_input());
    }

    #[test]
    fn test_destructive_action_waits_for_confirmation() {
        let mut app = app_at("/accounts");
        app.invoke_row_action("close", "acc-001").unwrap();
        assert!(matches!(app.modals.top(), Some(Modal::ConfirmAction { .. })));
        assert_eq!(app.find_account("acc-001").unwrap().status, AccountStatus::Active);

        press(&mut app, KeyCode::Char('y'));
        assert!(app.modals.is_empty());
        assert_eq!(app.find_account("acc-001").unwrap().status, AccountStatus::Closed);
    }

    #[test]
    fn test_suspend_applies_immediately_and_requeries() {
        let mut app = app_at("/accounts?status=ACTIVE&limit=100");
        let before = app.page.as_ref().unwrap().pagination.total;

        app.invoke_row_action("suspend", "acc-001").unwrap();
        app.finish_query();
        assert_eq!(app.page.as_ref().unwrap().pagination.total, before - 1);
        assert!(!page_ids(&app).contains(&"acc-001".to_string()));
    }

    #[test]
    fn test_row_click_opens_record_detail() {
        let mut app = app_at("/accounts");
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.modals.top(),
            Some(&Modal::RecordDetail {
                key: "acc-001".to_string()
            })
        );
        press(&mut app, KeyCode::Esc);
        assert!(app.modals.is_empty());
        assert!(app.record_dialog.is_none());
    }

    #[test]
    fn test_history_is_capped() {
        let mut app = app_at("/accounts");
        for page in 2..(HISTORY_LIMIT + 10) {
            app.navigate(Location::new("/accounts").with_page(page));
        }
        assert_eq!(app.back.len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_location_restores_filters_and_sort() {
        let app = app_at("/accounts?plan=pro&sort=balance&dir=desc");
        assert_eq!(app.filter_values.get(PLAN_KEY), "pro");
        assert_eq!(app.table.sort().map(|s| s.key.as_str()), Some("balance"));
    }
}
