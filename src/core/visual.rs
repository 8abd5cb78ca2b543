use crate::core::space::MonsterId;
use crate::game::symbol::Symbol;
use log::trace;

/// Sprite state for a command icon once it has been judged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconMark {
    Perfect,
    Early,
    Late,
    Miss,
}

/// Presentation side effects. The core never reads anything back.
pub trait VisualPresentation {
    fn set_highlight_alpha(&mut self, monster: MonsterId, alpha: f32);
    fn show_icon_queue(&mut self, monster: MonsterId, symbols: &[Symbol]);
    fn remove_front_icon(&mut self, monster: MonsterId);
    fn mark_front_icon(&mut self, monster: MonsterId, mark: IconMark);
    fn set_selected(&mut self, monster: MonsterId, selected: bool);
    fn despawn(&mut self, monster: MonsterId);
}

/// Traces every call. Alpha updates are per-frame, so they are not logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingVisual;

impl VisualPresentation for LoggingVisual {
    fn set_highlight_alpha(&mut self, _: MonsterId, _: f32) {}

    fn show_icon_queue(&mut self, monster: MonsterId, symbols: &[Symbol]) {
        let icons: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        trace!("{} icons [{}]", monster, icons.join(" "));
    }

    fn remove_front_icon(&mut self, monster: MonsterId) {
        trace!("{} icon popped", monster);
    }

    fn mark_front_icon(&mut self, monster: MonsterId, mark: IconMark) {
        trace!("{} icon marked {:?}", monster, mark);
    }

    fn set_selected(&mut self, monster: MonsterId, selected: bool) {
        trace!("{} selected={}", monster, selected);
    }

    fn despawn(&mut self, monster: MonsterId) {
        trace!("{} despawned", monster);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum VisualCall {
    Alpha(MonsterId, f32),
    ShowIcons(MonsterId, Vec<Symbol>),
    RemoveFrontIcon(MonsterId),
    MarkFrontIcon(MonsterId, IconMark),
    Selected(MonsterId, bool),
    Despawn(MonsterId),
}

impl VisualCall {
    pub fn monster(&self) -> MonsterId {
        match self {
            VisualCall::Alpha(id, _)
            | VisualCall::ShowIcons(id, _)
            | VisualCall::RemoveFrontIcon(id)
            | VisualCall::MarkFrontIcon(id, _)
            | VisualCall::Selected(id, _)
            | VisualCall::Despawn(id) => *id,
        }
    }
}

/// Keeps every call, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingVisual {
    pub calls: Vec<VisualCall>,
}

impl RecordingVisual {
    pub fn calls_for(&self, monster: MonsterId) -> impl Iterator<Item = &VisualCall> {
        self.calls.iter().filter(move |c| c.monster() == monster)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl VisualPresentation for RecordingVisual {
    fn set_highlight_alpha(&mut self, monster: MonsterId, alpha: f32) {
        self.calls.push(VisualCall::Alpha(monster, alpha));
    }

    fn show_icon_queue(&mut self, monster: MonsterId, symbols: &[Symbol]) {
        self.calls.push(VisualCall::ShowIcons(monster, symbols.to_vec()));
    }

    fn remove_front_icon(&mut self, monster: MonsterId) {
        self.calls.push(VisualCall::RemoveFrontIcon(monster));
    }

    fn mark_front_icon(&mut self, monster: MonsterId, mark: IconMark) {
        self.calls.push(VisualCall::MarkFrontIcon(monster, mark));
    }

    fn set_selected(&mut self, monster: MonsterId, selected: bool) {
        self.calls.push(VisualCall::Selected(monster, selected));
    }

    fn despawn(&mut self, monster: MonsterId) {
        self.calls.push(VisualCall::Despawn(monster));
    }
}
