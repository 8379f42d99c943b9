//! Counter Example - state updates driven by key presses
//!
//! Space (or Enter) clicks the button, `q` quits. Every commit reprints the
//! host tree together with what the pass did.
//!
//! Run with: cargo run --example counter
//! Logs:     RUST_LOG=spark_fiber=debug cargo run --example counter 2>fiber.log

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use spark_fiber::*;
use tracing_subscriber::EnvFilter;

const COUNTER: Component = Component::new("Counter", counter);

fn counter(cx: &mut Scope<'_>, _props: &Props) -> Rendered {
    let (count, set_count) = cx.use_state(0i32);

    Ok(create_element(
        "div",
        Props::new().with("className", "app"),
        children![
            create_element("h1", Props::new(), children!["spark-fiber counter"]),
            create_element(
                "button",
                Props::new().on("onClick", move |_| set_count.update(|n| n + 1)),
                children!["Count: ", count],
            ),
            (count >= 5).then(|| create_element("p", Props::new(), children!["High five!"])),
        ],
    ))
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut host = MemoryHost::new();
    let body = host.create_container("body");
    let mut root = Root::new(host, body);
    root.render(component(COUNTER, Props::new()));

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
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(&button) = root.host().find_by_tag(*root.container(), "button").first() {
                    root.host().click(button);
                }
            }
            _ => {}
        }
    }
}

fn draw(root: &Root<MemoryHost>, report: &RenderReport, out: &mut Stdout) -> io::Result<()> {
    execute!(out, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
    write!(out, "{}\r\n\r\n", root.host().to_markup(*root.container()))?;
    write!(
        out,
        "units: {}  created: {}  inserted: {}  text updates: {}  props set: {}\r\n",
        report.units_of_work,
        report.nodes_created,
        report.nodes_inserted,
        report.text_updates,
        report.props_set,
    )?;
    write!(out, "space: click   q: quit\r\n")?;
    out.flush()
}
