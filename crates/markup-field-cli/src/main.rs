use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markup_field_config::{Config, ConfigLayer, FieldConfig};
use markup_field_engine::{
    FieldRegistry, HostCapabilities, KeyEvent, NotificationLog, Page, PipelineKind, Pipelines,
    codes,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{
    env, fs,
    io::stdout,
    process,
    time::{Duration, Instant},
};

const DEMO_PAGE: &str = concat!(
    r#"<form id="story-form" action="/stories" method="post">"#,
    r#"<div id="headline">Markup <b>fields</b></div>"#,
    r#"<div id="body" type="area" style="width: 400px">Edit <i>this</i> text.<br>"#,
    r#"Links like <a href="http://example.org">this one</a> survive.</div>"#,
    "</form>",
);
const DEMO_FORM: &str = "story-form";
const FIELDS: [&str; 2] = ["headline", "body"];
const TICK: Duration = Duration::from_millis(25);

struct App {
    page: Page,
    registry: FieldRegistry,
    notifications: NotificationLog,
    submitted: Vec<(String, String)>,
}

impl App {
    fn new(global: ConfigLayer, capabilities: HostCapabilities) -> Result<Self> {
        let mut page = Page::with_capabilities(DEMO_PAGE, capabilities);
        let notifications = NotificationLog::new();
        let mut registry = FieldRegistry::new(global, Box::new(notifications.clone()));

        for id in FIELDS {
            let container = page
                .element(id)
                .with_context(|| format!("demo page has no element #{id}"))?;
            registry.create(&mut page, container, &ConfigLayer::default(), None)?;
        }
        registry.focus(&mut page, FIELDS[0])?;

        Ok(Self {
            page,
            registry,
            notifications,
            submitted: Vec::new(),
        })
    }

    fn focused(&self) -> String {
        self.registry.focused().unwrap_or(FIELDS[0]).to_string()
    }

    fn cycle_focus(&mut self) -> Result<()> {
        let next = self
            .registry
            .focused()
            .and_then(|id| FIELDS.iter().position(|f| *f == id))
            .map_or(0, |i| (i + 1) % FIELDS.len());
        self.registry.focus(&mut self.page, FIELDS[next])?;
        Ok(())
    }

    fn tick(&mut self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.registry.advance_time(&mut self.page, ms);
    }

    /// Feeds a terminal key to the focused field.
    fn key(&mut self, key: event::KeyEvent) -> Result<()> {
        let id = self.focused();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT) || key.code == KeyCode::BackTab;

        let code = match key.code {
            KeyCode::Char(c) if !ctrl && !alt => {
                self.registry
                    .type_text(&mut self.page, &id, &c.to_string())?;
                return Ok(());
            }
            KeyCode::Char(c) => c.to_ascii_uppercase() as u32,
            KeyCode::Enter => codes::ENTER,
            KeyCode::Tab | KeyCode::BackTab => codes::TAB,
            KeyCode::Backspace => codes::BACKSPACE,
            KeyCode::Delete => codes::DELETE,
            KeyCode::Esc => codes::ESCAPE,
            KeyCode::Left => codes::LEFT,
            KeyCode::Right => codes::RIGHT,
            KeyCode::Up => codes::UP,
            KeyCode::Down => codes::DOWN,
            KeyCode::Home => codes::HOME,
            KeyCode::End => codes::END,
            _ => return Ok(()),
        };

        let mut event = KeyEvent::new(code);
        if alt {
            event = event.with_alt();
        }
        if ctrl {
            event = event.with_ctrl();
        }
        if shift {
            event = event.with_shift();
        }
        let dispatch = self.registry.key_down(&mut self.page, &id, &event)?;
        log::debug!("{:?} on {id}: {dispatch:?}", event.chord());
        self.registry.key_up(&mut self.page, &id, &event)?;
        Ok(())
    }

    fn submit(&mut self) -> Result<()> {
        let submission = self.registry.submit_form(&mut self.page, DEMO_FORM)?;
        log::info!(
            "{} {} with {} values",
            submission.method,
            submission.action,
            submission.values.len()
        );
        self.submitted = submission.values;
        Ok(())
    }

    /// The field's editing surface, or its lifecycle state before there is one.
    fn field_text(&self, id: &str) -> String {
        let Some(field) = self.registry.field(id) else {
            return String::new();
        };
        match field.engine().surface(&self.page) {
            Some((dom, root)) => dom.inner_html(root),
            None => format!("({:?})", field.engine().state()),
        }
    }

    fn field_title(&self, id: &str) -> String {
        let Some(field) = self.registry.field(id) else {
            return id.to_string();
        };
        let lines = if field.config().is_multi_line() {
            "multi-line"
        } else {
            "single-line"
        };
        let postback = field.postback(&self.page);
        format!(
            "{id} [{lines}, {}] indent {} align {}",
            field.engine().kind(),
            postback.indent,
            postback.align
        )
    }
}

fn usage(program: &str) {
    eprintln!("Usage: {program} [demo [isolated|content-editable|legacy]]");
    eprintln!("       {program} filter <input|output|paste> <file>");
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let global = match Config::load() {
        Ok(config) => config.unwrap_or_default().field,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Config file: {}", Config::config_path().display());
            process::exit(1);
        }
    };

    match args.get(1).map(String::as_str) {
        Some("filter") => run_filter(&args, &global),
        Some("demo") | None => run_demo(global, args.get(2).map(String::as_str)),
        Some(_) => {
            usage(&args[0]);
            process::exit(1);
        }
    }
}

/// Runs one pipeline over a file and prints the result.
fn run_filter(args: &[String], global: &ConfigLayer) -> Result<()> {
    let (Some(kind), Some(path)) = (args.get(2), args.get(3)) else {
        usage(&args[0]);
        process::exit(1);
    };
    let kind = match kind.as_str() {
        "input" => PipelineKind::Input,
        "output" => PipelineKind::Output,
        "paste" => PipelineKind::Paste,
        other => bail!("unknown pipeline {other:?}, expected input, output or paste"),
    };
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;

    let pipelines = Pipelines::from_config(&FieldConfig::resolve(&[global]));
    println!("{}", pipelines.get(kind).run_html(&html));
    Ok(())
}

fn run_demo(global: ConfigLayer, engine: Option<&str>) -> Result<()> {
    let capabilities = match engine {
        None | Some("isolated") => HostCapabilities::design_mode(),
        Some("content-editable") => HostCapabilities::content_editable(),
        Some("legacy") => HostCapabilities::legacy(),
        Some(other) => bail!("unknown engine {other:?}"),
    };
    let mut app = App::new(global, capabilities)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(TICK)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::F(12) => return Ok(()),
                KeyCode::F(2) => app.cycle_focus()?,
                KeyCode::F(10) => app.submit()?,
                _ => app.key(key)?,
            }
        }

        let now = Instant::now();
        app.tick(now - last_tick);
        last_tick = now;
    }
}

fn ui(f: &mut Frame, app: &App) {
    let mut constraints: Vec<Constraint> = FIELDS.iter().map(|_| Constraint::Length(6)).collect();
    constraints.extend([Constraint::Min(4), Constraint::Length(1), Constraint::Length(1)]);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(constraints)
        .split(f.area());

    let focused = app.registry.focused();
    for (i, id) in FIELDS.iter().enumerate() {
        let border = if focused == Some(*id) {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let field = Paragraph::new(app.field_text(id))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(app.field_title(id)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(field, chunks[i]);
    }

    let submitted: Vec<Line> = if app.submitted.is_empty() {
        vec![Line::from("F10 submits the form")]
    } else {
        app.submitted
            .iter()
            .map(|(name, value)| Line::from(vec![Span::raw(format!("{name} = {value}"))]))
            .collect()
    };
    let submitted = Paragraph::new(submitted)
        .block(Block::default().borders(Borders::ALL).title("Submitted"))
        .wrap(Wrap { trim: false });
    f.render_widget(submitted, chunks[FIELDS.len()]);

    let message = app.notifications.last().unwrap_or_default();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red),
        ))),
        chunks[FIELDS.len() + 1],
    );

    let help = Line::from(vec![
        Span::raw("F12: Quit | "),
        Span::raw("F2: Next field | "),
        Span::raw("F10: Submit | "),
        Span::raw("Ctrl-H: Shortcuts"),
    ]);
    f.render_widget(Paragraph::new(help), chunks[FIELDS.len() + 2]);
}
