use super::domain::{GroupTally, Tally, VoteRecord};
use super::ScrutinError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub(crate) fn parse_document<R: Read>(reader: R) -> Result<VoteRecord, ScrutinError> {
    let document: ScrutinDocument = serde_json::from_reader(reader)?;
    document.scrutin.into_record()
}

#[derive(Debug, Deserialize)]
struct ScrutinDocument {
    scrutin: RawScrutin,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScrutin {
    uid: String,
    #[serde(deserialize_with = "deserialize_date")]
    date_scrutin: NaiveDate,
    titre: String,
    #[serde(default)]
    sort: Option<RawSort>,
    #[serde(default)]
    demandeur: Option<RawDemandeur>,
    synthese_vote: RawSynthese,
    #[serde(default)]
    ventilation_votes: Option<RawVentilation>,
}

#[derive(Debug, Deserialize)]
struct RawSort {
    #[serde(default)]
    libelle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDemandeur {
    #[serde(default)]
    texte: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSynthese {
    #[serde(deserialize_with = "deserialize_count")]
    nombre_votants: u32,
    decompte: RawDecompte,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecompte {
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pour: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    contre: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    abstentions: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    non_votants: Option<u32>,
    // Parsed so malformed values are still rejected, never displayed.
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    #[allow(dead_code)]
    non_votants_volontaires: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawVentilation {
    organe: RawOrgane,
}

#[derive(Debug, Deserialize)]
struct RawOrgane {
    groupes: RawGroupes,
}

#[derive(Debug, Deserialize)]
struct RawGroupes {
    groupe: OneOrMany<RawGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroup {
    organe_ref: String,
    #[serde(deserialize_with = "deserialize_count")]
    nombre_membres_groupe: u32,
    vote: RawGroupVote,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGroupVote {
    decompte_voix: RawDecompte,
}

/// The open-data export collapses single-element lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(u64),
    Text(String),
}

impl RawCount {
    fn value(self) -> Result<u32, String> {
        match self {
            RawCount::Number(value) => {
                u32::try_from(value).map_err(|_| format!("count {value} is out of range"))
            }
            RawCount::Text(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|err| format!("failed to parse '{raw}' as a vote count ({err})")),
        }
    }
}

impl RawScrutin {
    fn into_record(self) -> Result<VoteRecord, ScrutinError> {
        let tally = self.synthese_vote.decompte.into_tally("syntheseVote.decompte")?;

        let groups = match self.ventilation_votes {
            Some(ventilation) => ventilation
                .organe
                .groupes
                .groupe
                .into_vec()
                .into_iter()
                .map(RawGroup::into_group_tally)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(VoteRecord {
            id: self.uid,
            date: self.date_scrutin,
            title: self.titre.trim().to_string(),
            outcome_label: self
                .sort
                .and_then(|sort| sort.libelle)
                .map(|label| label.trim().to_string())
                .unwrap_or_default(),
            requester_text: self
                .demandeur
                .and_then(|demandeur| demandeur.texte)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            total_voters: self.synthese_vote.nombre_votants,
            tally,
            groups,
        })
    }
}

impl RawGroup {
    fn into_group_tally(self) -> Result<GroupTally, ScrutinError> {
        let scope = format!("groupe[{}].vote.decompteVoix", self.organe_ref);
        let tally = self.vote.decompte_voix.into_tally(&scope)?;
        Ok(GroupTally {
            organ_ref: self.organe_ref,
            members: self.nombre_membres_groupe,
            tally,
        })
    }
}

impl RawDecompte {
    fn into_tally(self, scope: &str) -> Result<Tally, ScrutinError> {
        Ok(Tally {
            for_votes: required(self.pour, scope, "pour")?,
            against: required(self.contre, scope, "contre")?,
            abstentions: required(self.abstentions, scope, "abstentions")?,
            non_voters: required(self.non_votants, scope, "nonVotants")?,
        })
    }
}

fn required(value: Option<u32>, scope: &str, key: &str) -> Result<u32, ScrutinError> {
    value.ok_or_else(|| ScrutinError::MissingField {
        field: format!("{scope}.{key}"),
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    RawCount::deserialize(deserializer)?
        .value()
        .map_err(serde::de::Error::custom)
}

fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<RawCount>::deserialize(deserializer)?;
    opt.map(|count| count.value().map_err(serde::de::Error::custom))
        .transpose()
}
