//! # Main Display Module
//!
//! Layout of the tuning lab window: input and result panels on the left,
//! the tonefield canvas in the middle, model info and tools on the right.

use iced::widget::{Space, button, column, container, horizontal_space, row, text, text_input};
use iced::{Alignment, Color, Element, Length};

use super::strength_meter::StrengthMeter;
use super::tonefield::Tonefield;
use crate::{AppDisplayData, Message};

/// Configuration for a single toggle in the tools sidebar
#[derive(Debug, Clone)]
struct ToggleConfig {
    label: &'static str,
    message: Message,
    is_active: fn(&AppDisplayData) -> bool,
}

const TOOLS_CONFIG: &[ToggleConfig] = &[
    ToggleConfig {
        label: "Hit Point Mode",
        message: Message::EnterHitPointMode,
        is_active: |data| data.hit_entry_mode,
    },
    ToggleConfig {
        label: "Link Visualizer",
        message: Message::ToggleVisualizerLink,
        is_active: |data| data.visualizer_linked,
    },
];

pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Tuning Lab").size(28);
    let status = text(data.status.clone().unwrap_or_default())
        .size(14)
        .color(Color::from_rgb(1.0, 0.76, 0.0));

    let left = column![
        create_input_panel(data),
        create_result_panel(data),
        create_coordinate_panel(data),
    ]
    .spacing(10)
    .width(Length::Fixed(320.0));

    let plot = Tonefield::new(
        data.shape,
        data.plotted_hit,
        data.selected.clone(),
        data.hit_marker,
    )
    .view();

    let main_content = row![
        column![
            title,
            status,
            Space::with_height(10),
            row![left, Space::with_width(10), plot].align_y(Alignment::Start),
        ]
        .width(Length::Fill)
        .spacing(5),
        Space::with_width(10),
        create_sidebar(data),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn labeled_input(
    label: &'static str,
    value: &str,
    on_input: fn(String) -> Message,
) -> Element<'static, Message> {
    row![
        text(label).size(14).width(Length::Fixed(110.0)),
        text_input("0.0", value)
            .on_input(on_input)
            .padding(5)
            .width(Length::Fill),
    ]
    .align_y(Alignment::Center)
    .into()
}

fn panel(title: &'static str, content: Element<'static, Message>) -> Element<'static, Message> {
    container(column![text(title).size(18), Space::with_height(5), content].spacing(5))
        .padding(15)
        .width(Length::Fill)
        .into()
}

fn create_input_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let content = column![
        labeled_input("Tonic (cents)", &data.tonic_input, Message::TonicChanged),
        labeled_input("Octave (cents)", &data.octave_input, Message::OctaveChanged),
        labeled_input("Fifth (cents)", &data.fifth_input, Message::FifthChanged),
        row![
            button(text("Predict Hit Point").size(14)).padding([6, 10]).on_press(Message::Predict),
            horizontal_space(),
            button(text("Reset").size(14)).padding([6, 10]).on_press(Message::Reset),
        ],
    ]
    .spacing(8);
    panel("Tuning Errors", content.into())
}

fn create_result_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let (l, s, strength) = match &data.prediction {
        Some(prediction) => (
            format!("{:.3}", prediction.hit.l),
            format!("{:.3}", prediction.hit.s),
            format!("{:.3}", prediction.hit.strength),
        ),
        None => ("--".to_string(), "--".to_string(), "--".to_string()),
    };
    let metric = |name: &'static str, value: String| {
        column![text(name).size(12), text(value).size(22)]
            .spacing(2)
            .width(Length::Fill)
    };

    let content = column![
        row![metric("L", l), metric("S", s), metric("Strength", strength)],
        StrengthMeter::new(data.prediction.as_ref().map(|p| p.hit.strength)).view(),
    ]
    .spacing(8);
    panel("Prediction", content.into())
}

fn create_coordinate_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let manual = row![
        text_input("x", &data.manual_x)
            .on_input(Message::ManualXChanged)
            .padding(5),
        text_input("y", &data.manual_y)
            .on_input(Message::ManualYChanged)
            .padding(5),
        button(text("Add Point").size(14)).padding([6, 10]).on_press(Message::AddManualPoint),
    ]
    .spacing(5);

    let listing = if data.selected.is_empty() {
        column![text("Click the tonefield to select coordinates").size(12)]
    } else {
        data.selected.iter().enumerate().fold(column![].spacing(2), |col, (i, (x, y))| {
            col.push(text(format!("{}. ({x:.3}, {y:.3})", i + 1)).size(13))
        })
    };

    let content = column![
        manual,
        listing,
        button(text("Clear All").size(14)).padding([6, 10]).on_press(Message::ClearCoords),
    ]
    .spacing(8);
    panel("Selected Coordinates", content.into())
}

fn create_hit_entry_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let coordinate = match data.hit_marker {
        Some((x, y)) => format!("Coordinate: ({x:.3}, {y:.3})"),
        None => "Coordinate: click the tonefield".to_string(),
    };
    let content = column![
        text(coordinate).size(13),
        labeled_input("Strength", &data.strength_input, Message::StrengthChanged),
        row![
            text("Intent").size(14).width(Length::Fixed(110.0)),
            text_input("e.g. raise tonic", &data.intent_input)
                .on_input(Message::IntentChanged)
                .padding(5),
        ]
        .align_y(Alignment::Center),
        button(text("Save").size(14)).padding([6, 10]).on_press(Message::SaveHitPoint),
        text(format!("{} samples recorded", data.saved_samples)).size(12),
    ]
    .spacing(8);
    panel("Hit Point Entry", content.into())
}

fn create_model_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let info = &data.model_info;
    let mut content = column![
        text(info.name.clone()).size(16),
        text(format!("Version {}", info.version)).size(12),
        text(info.description.clone()).size(13),
    ]
    .spacing(4);
    if let Some(formula) = &info.formula {
        content = content
            .push(Space::with_height(5))
            .push(text(format!("L = {}", formula.l)).size(12))
            .push(text(format!("S = {}", formula.s)).size(12))
            .push(text(format!("strength = {}", formula.strength)).size(12));
    }
    if let Some(status) = &info.status {
        content = content.push(text(format!("Status: {status}")).size(12));
    }
    panel("Model", content.into())
}

fn make_toggle(config: &ToggleConfig, data: &AppDisplayData) -> Element<'static, Message> {
    let mut toggle = button(text(config.label).size(14).width(Length::Fill)).padding([6, 10]);
    if (config.is_active)(data) {
        toggle = toggle.style(|_theme, _status| {
            use iced::widget::button;
            button::Style {
                background: Some(iced::Background::Color(Color::from_rgb(0.8, 0.2, 0.2))),
                text_color: Color::WHITE,
                ..button::Style::default()
            }
        });
    }
    toggle.on_press(config.message.clone()).into()
}

fn create_sidebar(data: &AppDisplayData) -> Element<'static, Message> {
    let tools = TOOLS_CONFIG
        .iter()
        .fold(column![text("Tools").size(18)].spacing(8), |col, config| {
            col.push(make_toggle(config, data))
        });

    let mut sections = column![create_model_panel(data), container(tools).padding(15)].spacing(10);
    if data.hit_entry_mode {
        sections = sections.push(create_hit_entry_panel(data));
    }

    container(sections)
        .width(Length::Fixed(300.0))
        .height(Length::Fill)
        .into()
}
