//! Events emitted during a tick.
//!
//! Every event renders to a player-facing message (in the game's language)
//! and carries an [`EventCategory`] the journal uses for grouping. The
//! structured form is serializable so a runner can also dump events as JSONL.

use crate::attributes::AttributeKey;
use crate::fixed::Fixed;
use crate::state::{ProvinceId, Tag};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Data problems an administrator has to fix.
    Admin,
    Notice,
    Warning,
}

impl EventCategory {
    /// Journal label for the category.
    pub fn label(self) -> &'static str {
        match self {
            EventCategory::Admin => "Сообщить Администрации",
            EventCategory::Notice => "Уведомление",
            EventCategory::Warning => "ВНИМАНИЕ",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a resource flow could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shortage {
    /// Resource is not tracked by the state's ledger at all.
    Unknown { resource: String },
    Insufficient {
        resource: String,
        required: Fixed,
        available: Fixed,
    },
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortage::Unknown { resource } => {
                write!(f, "Тип ресурса \"{resource}\" не найден на складе.")
            }
            Shortage::Insufficient {
                resource,
                required,
                available,
            } => write!(f, "{resource}: требуется {required}, доступно {available}"),
        }
    }
}

/// Non-fatal per-building message, folded into one entry per province.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProvinceNotice {
    ProvinceCriteria {
        building: String,
        reasons: Vec<String>,
    },
    StateCriteria {
        state: Tag,
        building: String,
        owner: Tag,
        reasons: Vec<String>,
    },
    Attributes {
        building: String,
        reasons: Vec<String>,
    },
    Dependencies {
        building: String,
        requirement: String,
    },
    Workers {
        building: String,
        required: u64,
        available: u64,
    },
    Land {
        building: String,
        required: u64,
        available: u64,
    },
    Consumption {
        building: String,
        shortages: Vec<Shortage>,
    },
    Production {
        building: String,
        shortages: Vec<Shortage>,
    },
    DepositNotFound {
        building: String,
        resource: String,
    },
    /// Extraction needs a resource the ledger does not track.
    ExtractionUnknownResource {
        building: String,
        resource: String,
    },
    DepositDepleting {
        building: String,
        resource: String,
        cycles: i64,
    },
    DepositDepleted {
        building: String,
        resource: String,
    },
}

impl ProvinceNotice {
    /// Renders the notice for the given province.
    pub fn render(&self, province: &str) -> String {
        match self {
            ProvinceNotice::ProvinceCriteria { building, reasons } => format!(
                "Провинция \"{province}\" не подходит для здания \"{building}\". Причины: {}",
                reasons.join("; ")
            ),
            ProvinceNotice::StateCriteria {
                state,
                building,
                owner,
                reasons,
            } => format!(
                "Государство \"{state}\" не подходит для здания \"{building}\". \
                 Владелец постройки \"{owner}\". Причины: {}",
                reasons.join("; ")
            ),
            ProvinceNotice::Attributes { building, reasons } => format!(
                "Провинция \"{province}\" не соответствует атрибутам для постройки \"{building}\". Причины: {}",
                reasons.join("; ")
            ),
            ProvinceNotice::Dependencies {
                building,
                requirement,
            } => format!(
                "Провинция \"{province}\" не соответствует требованиям по зависимым постройкам \
                 для \"{building}\". Постройка \"{building}\" требует: {requirement}"
            ),
            ProvinceNotice::Workers {
                building,
                required,
                available,
            } => format!(
                "Не хватает рабочей силы для постройки \"{building}\" в провинции \"{province}\". \
                 Необходимо {required}, доступно {available}. Постройка получит статус \"Неактивная\"."
            ),
            ProvinceNotice::Land {
                building,
                required,
                available,
            } => format!(
                "Недостаточно агрокультурных земель для постройки \"{building}\" в провинции \
                 \"{province}\". Необходимо {required}, доступно {available}. \
                 Постройка получит статус \"Неактивная\"."
            ),
            ProvinceNotice::Consumption {
                building,
                shortages,
            } => format!(
                "Постройке \"{building}\" не хватает ресурсов: {}",
                join(shortages)
            ),
            ProvinceNotice::Production {
                building,
                shortages,
            } => format!(
                "Постройка \"{building}\" не может сдать продукцию: {}",
                join(shortages)
            ),
            ProvinceNotice::DepositNotFound { building, resource } => format!(
                "Постройка \"{building}\" не находит запасы необходимого ресурса \"{resource}\". \
                 Добыча будет остановлена."
            ),
            ProvinceNotice::ExtractionUnknownResource { resource, .. } => {
                format!("Тип ресурса \"{resource}\" не найден в складе.")
            }
            ProvinceNotice::DepositDepleting {
                building,
                resource,
                cycles,
            } => format!(
                "Постройка \"{building}\" истощает запасы ресурса \"{resource}\". \
                 Добыча будет остановлена через {cycles} ходов."
            ),
            ProvinceNotice::DepositDepleted { building, resource } => format!(
                "Постройка \"{building}\" истощила запасы ресурса \"{resource}\". \
                 Добыча будет остановлена."
            ),
        }
    }
}

fn join(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Events recorded during a tick, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickEvent {
    /// A building references a template the catalog does not have.
    TemplateMissing {
        province: ProvinceId,
        building: String,
    },
    /// All non-fatal building messages for one province.
    ProvinceNotices {
        province: ProvinceId,
        notices: Vec<ProvinceNotice>,
    },
    /// An inactive building is counting down to demolition.
    DemolitionPending {
        province: ProvinceId,
        building: String,
        turns: u32,
    },
    Demolished {
        province: ProvinceId,
        building: String,
    },
    ProvinceAttributeClamped {
        province: ProvinceId,
        attribute: AttributeKey,
        old: Fixed,
        new: Fixed,
    },
    StateAttributeClamped {
        attribute: AttributeKey,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        old: Fixed,
        new: Fixed,
    },
    StateLimitEviction {
        building: String,
        province: ProvinceId,
    },
    ProvinceLimitEviction {
        building: String,
        province: ProvinceId,
        count: usize,
        limit: u32,
    },
    /// Global cap exceeded but the acting state owns no instance.
    GlobalLimitNothingOwned {
        building: String,
        count: usize,
        limit: u32,
    },
    /// Global cap exceeded but every own instance is older than the others.
    GlobalLimitNothingEligible {
        building: String,
        count: usize,
        limit: u32,
    },
    GlobalLimitEviction {
        building: String,
        province: ProvinceId,
    },
}

impl TickEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            TickEvent::TemplateMissing { .. } => EventCategory::Admin,
            TickEvent::StateAttributeClamped { .. }
            | TickEvent::StateLimitEviction { .. }
            | TickEvent::ProvinceLimitEviction { .. } => EventCategory::Warning,
            TickEvent::ProvinceNotices { .. }
            | TickEvent::DemolitionPending { .. }
            | TickEvent::Demolished { .. }
            | TickEvent::ProvinceAttributeClamped { .. }
            | TickEvent::GlobalLimitNothingOwned { .. }
            | TickEvent::GlobalLimitNothingEligible { .. }
            | TickEvent::GlobalLimitEviction { .. } => EventCategory::Notice,
        }
    }
}

impl fmt::Display for TickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickEvent::TemplateMissing { province, building } => write!(
                f,
                "Шаблон для постройки \"{building}\" в провинции \"{province}\" не найден. \
                 Постройка получила статус \"Неактивная\" и будет снесена через некоторое \
                 количество ходов."
            ),
            TickEvent::ProvinceNotices { province, notices } => {
                let rendered: Vec<String> = notices.iter().map(|n| n.render(province)).collect();
                write!(f, "Провинция \"{province}\": {}", rendered.join("; "))
            }
            TickEvent::DemolitionPending {
                province,
                building,
                turns,
            } => write!(
                f,
                "Здание \"{building}\" в провинции \"{province}\" будет снесено через {turns} ходов \
                 по причине длительной неактивности."
            ),
            TickEvent::Demolished { province, building } => write!(
                f,
                "Здание \"{building}\" в провинции \"{province}\" было снесено из-за длительной \
                 неактивности."
            ),
            TickEvent::ProvinceAttributeClamped {
                province,
                attribute,
                old,
                new,
            } => write!(
                f,
                "Провинция \"{province}\": Атрибут \"{attribute}\" скорректирован с {old} до {new} \
                 из-за нарушения ограничения."
            ),
            TickEvent::StateAttributeClamped {
                attribute,
                label,
                old,
                new,
            } => match label {
                Some(label) => write!(
                    f,
                    "Количество {label}({attribute}) было изменено с {old} на {new} \
                     из-за нарушения лимита накопления."
                ),
                None => write!(
                    f,
                    "Атрибут государства \"{attribute}\" был изменен с {old} на {new} \
                     из-за нарушения лимита накопления."
                ),
            },
            TickEvent::StateLimitEviction { building, province } => write!(
                f,
                "Лимит построек типа \"{building}\" для государства превышен. \
                 Постройка удалена из провинции \"{province}\"."
            ),
            TickEvent::ProvinceLimitEviction {
                building,
                province,
                count,
                limit,
            } => write!(
                f,
                "Лимит построек типа \"{building}\" для провинции \"{province}\" превышен \
                 {count}/{limit}. Постройка была удалена."
            ),
            TickEvent::GlobalLimitNothingOwned {
                building,
                count,
                limit,
            } => write!(
                f,
                "Глобальный лимит для постройки \"{building}\" превышен ({count}/{limit}), \
                 но нет построек в ваших провинциях для удаления."
            ),
            TickEvent::GlobalLimitNothingEligible {
                building,
                count,
                limit,
            } => write!(
                f,
                "Глобальный лимит для постройки \"{building}\" превышен ({count}/{limit}), \
                 но все ваши постройки старее или равны по cycle_count построек других государств."
            ),
            TickEvent::GlobalLimitEviction { building, province } => write!(
                f,
                "Лимит на количество построек \"{building}\" превышен для мира. \
                 Постройка в вашей провинции \"{province}\" была удалена."
            ),
        }
    }
}

/// Rendered log entry: message plus category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub category: EventCategory,
}

/// Append-only, ordered event log for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<TickEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TickEvent) {
        log::trace!("event: {event}");
        self.events.push(event);
    }

    pub fn events(&self) -> &[TickEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TickEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rendered `(message, category)` pairs in emission order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.events
            .iter()
            .map(|e| LogEntry {
                message: e.to_string(),
                category: e.category(),
            })
            .collect()
    }
}
