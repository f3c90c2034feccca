use super::messages::Message;
use super::state::{App, MAX_FONT_SIZE, MAX_VOLUME, MIN_FONT_SIZE, MIN_VOLUME};
use crate::config::ThemeMode;
use crate::playback::{MAX_RATE, MIN_RATE, PlaybackPhase};
use iced::alignment::Vertical;
use iced::widget::text::LineHeight;
use iced::widget::{
    Column, Row, button, column, container, horizontal_space, pick_list, row, slider, text,
    text_editor, text_input,
};
use iced::{Element, Length};

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let content: Column<'_, Message> = column![
            self.open_bar(),
            self.transport_controls(),
            self.tuning_controls(),
            self.page_area(),
            self.seek_bar(),
            self.status_line(),
        ]
        .padding(16)
        .spacing(12)
        .height(Length::Fill);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

impl App {
    fn open_bar(&self) -> Row<'_, Message> {
        let path_input = text_input("Path to a .txt or .pdf file", &self.open_path_input)
            .on_input(Message::OpenPathInputChanged)
            .on_submit(Message::OpenPathRequested)
            .width(Length::Fill);
        let open_button = if self.loading.is_some() {
            button("Opening...")
        } else {
            button("Open").on_press(Message::OpenPathRequested)
        };
        let theme_label = if matches!(self.config.theme, ThemeMode::Night) {
            "Day Mode"
        } else {
            "Night Mode"
        };

        row![
            path_input,
            open_button,
            button(theme_label).on_press(Message::ToggleTheme)
        ]
        .spacing(10)
        .align_y(Vertical::Center)
    }

    fn transport_controls(&self) -> Row<'_, Message> {
        let has_pages = self.session.has_pages();
        let phase = self.session.phase();
        let current = self.session.current_page();

        let read_button = button("Read").on_press_maybe(has_pages.then_some(Message::Read));
        let pause_label = match phase {
            PlaybackPhase::Paused => "Resume",
            _ => "Pause",
        };
        let pause_button = button(pause_label)
            .on_press_maybe((phase != PlaybackPhase::Idle).then_some(Message::TogglePause));
        let sync_button = button("Sync").on_press_maybe(has_pages.then_some(Message::Sync));
        let stop_button =
            button("Stop").on_press_maybe((phase != PlaybackPhase::Idle).then_some(Message::Stop));
        let prev_button =
            button("Previous").on_press_maybe((current > 0).then_some(Message::PreviousPage));
        let next_button = button("Next").on_press_maybe(
            (current + 1 < self.session.page_count()).then_some(Message::NextPage),
        );

        let mut controls = row![
            read_button,
            pause_button,
            sync_button,
            stop_button,
            prev_button,
            next_button
        ]
        .spacing(10)
        .align_y(Vertical::Center);

        if self.bookmarks.is_some() {
            controls = controls.push(
                button("Save bookmark").on_press_maybe(has_pages.then_some(Message::SaveBookmark)),
            );
        }

        controls
            .push(horizontal_space())
            .push(text(self.page_label()))
    }

    fn tuning_controls(&self) -> Row<'_, Message> {
        let rate = self.session.state().rate;
        let mut controls = row![
            column![
                text(format!("Rate: {rate:.1}x")),
                slider(MIN_RATE..=MAX_RATE, rate, Message::SetRate).step(0.1)
            ]
            .spacing(4)
            .width(Length::FillPortion(1)),
            column![
                text(format!("Volume: {:.0}%", self.volume * 100.0)),
                slider(MIN_VOLUME..=MAX_VOLUME, self.volume, Message::SetVolume).step(0.01)
            ]
            .spacing(4)
            .width(Length::FillPortion(1)),
            column![
                text(format!("Font: {}", self.config.font_size)),
                slider(
                    MIN_FONT_SIZE as f32..=MAX_FONT_SIZE as f32,
                    self.config.font_size as f32,
                    |value| Message::FontSizeChanged(value.round() as u32),
                )
            ]
            .spacing(4)
            .width(Length::FillPortion(1)),
        ]
        .spacing(12)
        .align_y(Vertical::Center)
        .width(Length::Fill);

        if self.config.voice_selection {
            let picker = pick_list(
                self.voices.as_slice(),
                self.selected_voice(),
                Message::VoiceSelected,
            )
            .placeholder(if self.voices.is_empty() {
                "No voices"
            } else {
                "Default voice"
            });
            controls = controls.push(
                column![text("Voice"), picker]
                    .spacing(4)
                    .width(Length::FillPortion(1)),
            );
        }

        controls
    }

    fn page_area(&self) -> Element<'_, Message> {
        if !self.session.has_pages() {
            let hint = if self.loading.is_some() {
                "Loading document..."
            } else {
                "Open a text or PDF file to start reading."
            };
            return container(text(hint))
                .padding([self.config.margin_vertical, self.config.margin_horizontal])
                .width(Length::Fill)
                .height(Length::Fill)
                .into();
        }

        container(
            text_editor(&self.page_view)
                .on_action(Message::PageEditorAction)
                .size(self.config.font_size as f32)
                .line_height(LineHeight::Relative(self.config.line_spacing))
                .height(Length::Fill),
        )
        .padding([self.config.margin_vertical, self.config.margin_horizontal])
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn seek_bar(&self) -> Element<'_, Message> {
        let last = self.session.last_page();
        if last == 0 {
            return horizontal_space().into();
        }
        slider(
            0.0..=last as f32,
            self.session.current_page() as f32,
            |value| Message::Seek(value.round() as i64),
        )
        .step(1.0)
        .into()
    }

    fn status_line(&self) -> Row<'_, Message> {
        let mut status = row![text(format!("Status: {}", self.session.phase()))]
            .spacing(16)
            .align_y(Vertical::Center);
        if let Some(ticket) = &self.loading {
            status = status.push(text(format!("Loading {}...", ticket.path.display())));
        }
        if let Some(notice) = &self.notice {
            status = status.push(text(notice.as_str()));
        }
        status
    }

    fn page_label(&self) -> String {
        let count = self.session.page_count();
        if count == 0 {
            "No document".to_string()
        } else {
            format!("Page {} of {}", self.session.current_page() + 1, count)
        }
    }
}
