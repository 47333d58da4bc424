use crate::app::Scene;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use digipet::sim::Action;
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UiCommand {
    Pet(Action),
    AskReset,
    HelpToggle,
    ToggleColor,
    Back,
    Dismiss,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event(scene: &Scene, ev: &InputEvent) -> Option<UiCommand> {
    // Raw mode swallows SIGINT.
    if ev.key == KeyCode::Char('c') && ev.mods.contains(KeyModifiers::CONTROL) {
        return Some(UiCommand::Quit);
    }

    let key = match ev.key {
        KeyCode::Char(ch) => KeyCode::Char(ch.to_ascii_lowercase()),
        other => other,
    };

    match scene {
        Scene::Main => match key {
            KeyCode::Char('f') => Some(UiCommand::Pet(Action::Feed)),
            KeyCode::Char('p') => Some(UiCommand::Pet(Action::Play)),
            KeyCode::Char('c') => Some(UiCommand::Pet(Action::Clean)),
            KeyCode::Char('s') => Some(UiCommand::Pet(Action::ToggleSleep)),
            KeyCode::Char('r') => Some(UiCommand::AskReset),
            KeyCode::Char('o') => Some(UiCommand::ToggleColor),
            KeyCode::Char('h') => Some(UiCommand::HelpToggle),
            KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
            _ => None,
        },
        Scene::Help => match key {
            KeyCode::Char('h') | KeyCode::Esc => Some(UiCommand::Back),
            KeyCode::Char('q') => Some(UiCommand::Quit),
            _ => None,
        },
        Scene::ConfirmReset => match key {
            KeyCode::Char('y') => Some(UiCommand::Pet(Action::Reset)),
            KeyCode::Char('n') | KeyCode::Esc => Some(UiCommand::Back),
            _ => None,
        },
        Scene::Recap(_) => Some(UiCommand::Dismiss),
        Scene::Dead => match key {
            KeyCode::Char('n') => Some(UiCommand::Pet(Action::Reset)),
            KeyCode::Char('q') | KeyCode::Esc => Some(UiCommand::Quit),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> InputEvent {
        InputEvent {
            key: KeyCode::Char(ch),
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn main_scene_keys() {
        assert_eq!(map_event(&Scene::Main, &key('F')), Some(UiCommand::Pet(Action::Feed)));
        assert_eq!(map_event(&Scene::Main, &key('s')), Some(UiCommand::Pet(Action::ToggleSleep)));
        assert_eq!(map_event(&Scene::Main, &key('r')), Some(UiCommand::AskReset));
        assert_eq!(map_event(&Scene::Main, &key('z')), None);
    }

    #[test]
    fn reset_needs_confirmation() {
        assert_eq!(
            map_event(&Scene::ConfirmReset, &key('y')),
            Some(UiCommand::Pet(Action::Reset))
        );
        assert_eq!(map_event(&Scene::ConfirmReset, &key('f')), None);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ev = InputEvent {
            key: KeyCode::Char('c'),
            mods: KeyModifiers::CONTROL,
        };
        assert_eq!(map_event(&Scene::ConfirmReset, &ev), Some(UiCommand::Quit));
    }
}
