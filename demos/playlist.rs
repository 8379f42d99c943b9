//! Playlist Example - suspense on a slow resource
//!
//! The playlist is "fetched" with a fake delay. While it loads the fallback
//! is shown; once the resolver fires the list renders. Number keys select a
//! track (by clicking its row), `r` refetches, `q` quits.
//!
//! Run with: cargo run --example playlist

use std::cell::RefCell;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use spark_fiber::*;
use tracing_subscriber::EnvFilter;

const FETCH_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone)]
struct Track {
    title: &'static str,
    artist: &'static str,
    secs: u32,
}

thread_local! {
    /// Fake network: resolvers waiting for their delivery time.
    static IN_FLIGHT: RefCell<Vec<(Instant, Resolver<Vec<Track>>)>> = const { RefCell::new(Vec::new()) };
}

fn fetch_playlist(resolver: Resolver<Vec<Track>>) {
    IN_FLIGHT.with(|q| q.borrow_mut().push((Instant::now() + FETCH_DELAY, resolver)));
}

/// Resolve every fake request whose time has come.
fn deliver_due() {
    let due: Vec<_> = IN_FLIGHT.with(|q| {
        let mut q = q.borrow_mut();
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) = q.drain(..).partition(|(at, _)| *at <= now);
        *q = waiting;
        due
    });
    for (_, resolver) in due {
        resolver.resolve(vec![
            Track { title: "Intro", artist: "The Fibers", secs: 94 },
            Track { title: "Work Loop", artist: "Idle Callback", secs: 201 },
            Track { title: "Commit Phase", artist: "The Fibers", secs: 187 },
            Track { title: "Suspense", artist: "Fallback", secs: 240 },
        ]);
    }
}

// =============================================================================
// Components
// =============================================================================

const PLAYLIST: Component = Component::new("Playlist", playlist);

fn playlist(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    let (selected, set_selected) = cx.use_state(None::<usize>);
    let tracks: Vec<Track> = cx.resource("playlist", fetch_playlist).ready()?;

    let rows: Vec<Element> = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let set_selected = set_selected.clone();
            let marker = if selected == Some(i) { "> " } else { "  " };
            create_element(
                "li",
                Props::new()
                    .with("className", if selected == Some(i) { "selected" } else { "" })
                    .on("onClick", move |_| set_selected.set(Some(i))),
                children![format!(
                    "{marker}{}. {} - {} ({}:{:02})",
                    i + 1,
                    track.title,
                    track.artist,
                    track.secs / 60,
                    track.secs % 60
                )],
            )
        })
        .collect();

    Ok(create_element(
        "section",
        Props::new(),
        children![
            create_element("h1", Props::new(), children!["Playlist"]),
            create_element("ol", Props::new(), children![rows]),
        ],
    ))
}

// =============================================================================
// Main
// =============================================================================

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body);
    root.render(component(PLAYLIST, Props::new()));

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut root, &mut stdout);

    execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run(root: &mut Root<MemoryHost>, out: &mut Stdout) -> io::Result<()> {
    let mut scheduler = FrameBudget::default();

    loop {
        deliver_due();

        match root.tick(&mut scheduler) {
            Ok(WorkStatus::Committed(report)) => draw(root, &report, out)?,
            Ok(_) => {}
            Err(err) => return Err(io::Error::other(err.to_string())),
        }

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let TermEvent::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('r') => {
                root.resources().invalidate::<Vec<Track>>("playlist");
                root.trigger().request();
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let index = c as usize - '1' as usize;
                let rows = root.host().find_by_tag(*root.container(), "li");
                if let Some(&row) = rows.get(index) {
                    root.host().click(row);
                }
            }
            _ => {}
        }
    }
}

fn draw(root: &Root<MemoryHost>, report: &RenderReport, out: &mut Stdout) -> io::Result<()> {
    let host = root.host();
    let body = *root.container();

    execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
    for heading in host.find_by_tag(body, "h1").into_iter().chain(host.find_by_tag(body, "h2")) {
        write!(out, "{}\r\n\r\n", host.text_content(heading))?;
    }
    for row in host.find_by_tag(body, "li") {
        write!(out, "{}\r\n", host.text_content(row))?;
    }
    write!(
        out,
        "\r\nunits: {}  suspended: {}  created: {}  removed: {}\r\n",
        report.units_of_work, report.suspended, report.nodes_created, report.nodes_removed,
    )?;
    write!(out, "1-9: select   r: refetch   q: quit\r\n")?;
    out.flush()
}
