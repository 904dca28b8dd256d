use std::sync::Arc;

use gloo_timers::callback::Interval;
use reelpick_core::{
    Catalog, ConfettiField, ConfigError, EntropySource, MachineConfig, Particle, Prize,
    ReelSnapshot, RoundEvent, SpinOrchestrator,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};
use yew::prelude::*;

const FRAME_MS: u32 = 16;
const CANVAS_W: f64 = 480.0;
const CANVAS_H: f64 = 360.0;

struct Widget {
    machine: SpinOrchestrator<EntropySource>,
    confetti: ConfettiField,
}

fn build_widget() -> Result<Widget, ConfigError> {
    let machine = SpinOrchestrator::new(
        Arc::new(Catalog::music()),
        MachineConfig::default(),
        EntropySource::new(),
    )?;
    Ok(Widget {
        machine,
        confetti: ConfettiField::new(CANVAS_W, CANVAS_H),
    })
}

fn now_ms() -> u64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0) as u64
}

impl Widget {
    fn frame(&mut self) {
        let Widget { machine, confetti } = self;
        for event in machine.tick(now_ms()) {
            if let RoundEvent::WinnerRevealed {
                prize, celebration, ..
            } = event
            {
                log::info!("winner: {}", prize.name);
                confetti.fire(&celebration, machine.rng_mut());
            }
        }
        confetti.step();
    }
}

#[function_component(App)]
fn app() -> Html {
    let widget = use_mut_ref(build_widget);
    let redraw = use_force_update();

    {
        let widget = widget.clone();
        use_effect_with((), move |_| {
            let interval = Interval::new(FRAME_MS, move || {
                if let Ok(w) = widget.borrow_mut().as_mut() {
                    w.frame();
                }
                redraw.force_update();
            });
            move || drop(interval)
        });
    }

    let guard = widget.borrow();
    let w = match guard.as_ref() {
        Ok(w) => w,
        Err(e) => return html! { <pre>{format!("slot machine misconfigured: {e}")}</pre> },
    };

    let now = now_ms();
    let snap = w.machine.snapshot(now);
    let spinning = snap.state.in_progress();
    let catalog = w.machine.catalog().clone();
    let item_height = w.machine.config().item_height;
    let particles = w.confetti.particles().to_vec();
    let winner = w.machine.winner().cloned();

    let winner_view = match winner {
        Some(prize) if !spinning => html! {
            <strong style={format!("color:{}", prize.color)}>{format!("✨ {}", prize.name)}</strong>
        },
        _ => html! {},
    };

    let do_spin = {
        let widget = widget.clone();
        Callback::from(move |_: MouseEvent| {
            if let Ok(w) = widget.borrow_mut().as_mut() {
                w.machine.trigger_round(now_ms());
            }
        })
    };

    html! {
        <div class="slot-machine">
            <h1>{"听点什么?"}</h1>
            <div class="reels" style="display:flex;gap:8px;position:relative">
                { for snap.reels.iter().map(|r| html! {
                    <Reel snapshot={r.clone()} catalog={catalog.clone()} item_height={item_height} />
                }) }
                <Confetti particles={particles} />
            </div>
            <div class="status">
                <span>{snap.caption}</span>
                {winner_view}
            </div>
            <button onclick={do_spin} disabled={spinning}>
                { if spinning { "SPINNING..." } else { "开始抽取" } }
            </button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ReelProps {
    snapshot: ReelSnapshot,
    catalog: Catalog,
    item_height: u32,
}

#[function_component(Reel)]
fn reel(props: &ReelProps) -> Html {
    let h = props.item_height;
    html! {
        <div class="reel" style={format!("height:{h}px;overflow:hidden;flex:1")}>
            <div style={format!("transform:translateY({}px)", props.snapshot.offset)}>
                { for props.snapshot.strip.iter().map(|&i| prize_card(props.catalog.get(i), h)) }
            </div>
        </div>
    }
}

fn prize_card(prize: &Prize, height: u32) -> Html {
    html! {
        <div style={format!("height:{height}px;display:flex;flex-direction:column;align-items:center;justify-content:center")}>
            <div style={format!("width:96px;height:96px;border-radius:22px;background:{};color:{};display:flex;align-items:center;justify-content:center", prize.color, prize.text_color)}>
                <svg viewBox={prize.icon_view_box} width="64" height="64">
                    <path d={prize.icon} fill="currentColor" />
                </svg>
            </div>
            <span>{prize.name}</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ConfettiProps {
    particles: Vec<Particle>,
}

#[function_component(Confetti)]
fn confetti(props: &ConfettiProps) -> Html {
    let node_ref = use_node_ref();
    {
        let node_ref = node_ref.clone();
        let particles = props.particles.clone();
        use_effect_with(particles, move |particles| {
            let ctx = node_ref
                .cast::<HtmlCanvasElement>()
                .and_then(|canvas| canvas.get_context("2d").ok().flatten())
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
            if let Some(ctx) = ctx {
                ctx.clear_rect(0.0, 0.0, CANVAS_W, CANVAS_H);
                for p in particles {
                    ctx.set_global_alpha(p.opacity());
                    ctx.set_fill_style(&JsValue::from_str(p.color));
                    ctx.fill_rect(p.x, p.y, 6.0 * p.scalar, 4.0 * p.scalar);
                }
                ctx.set_global_alpha(1.0);
            }
        });
    }

    html! {
        <canvas ref={node_ref} width={CANVAS_W.to_string()} height={CANVAS_H.to_string()}
            style="position:absolute;inset:0;pointer-events:none"></canvas>
    }
}

#[wasm_bindgen(start)]
pub fn run() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
