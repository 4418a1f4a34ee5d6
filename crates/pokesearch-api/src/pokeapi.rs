//! PokéAPI client implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use pokesearch_core::error::DexError;
use pokesearch_core::model::{Creature, DexEntry, EvolutionNode, Species, TypeDamageRelations};
use pokesearch_core::traits::DexClient;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for PokéAPI v2.
pub struct PokeApiClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl PokeApiClient {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, DexError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pokesearch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DexError::Transport {
                status: None,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `url` and decode the body. 404 is [`DexError::NotFound`]; every
    /// other failure is a transport, timeout or decode error.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DexError> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DexError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                DexError::Transport {
                    status: None,
                    message: format!("PokéAPI not reachable at {}: {e}", self.base_url),
                }
            } else {
                DexError::Transport {
                    status: None,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(DexError::NotFound(url.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(DexError::Transport {
                status: Some(status),
                message: body,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                DexError::Timeout(self.timeout_secs)
            } else {
                DexError::Decode(format!("{url}: {e}"))
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct NamedResource {
    name: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct UrlResource {
    url: String,
}

#[derive(Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: SpritesResponse,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    weight: u32,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
    species: UrlResource,
}

#[derive(Deserialize, Default)]
struct SpritesResponse {
    #[serde(default)]
    front_default: Option<String>,
}

#[derive(Deserialize)]
struct TypeSlot {
    slot: u32,
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Deserialize)]
struct AbilitySlot {
    ability: NamedResource,
}

#[derive(Deserialize)]
struct TypeResponse {
    damage_relations: DamageRelationsResponse,
}

#[derive(Deserialize)]
struct DamageRelationsResponse {
    #[serde(default)]
    double_damage_from: Vec<NamedResource>,
}

#[derive(Deserialize)]
struct SpeciesResponse {
    generation: NamedResource,
    #[serde(default)]
    evolution_chain: Option<UrlResource>,
}

#[derive(Deserialize)]
struct EvolutionChainResponse {
    chain: ChainLink,
}

#[derive(Deserialize)]
struct ChainLink {
    species: NamedResource,
    #[serde(default)]
    evolves_to: Vec<ChainLink>,
}

impl From<ChainLink> for EvolutionNode {
    fn from(link: ChainLink) -> Self {
        EvolutionNode {
            species: link.species.name,
            evolves_to: link.evolves_to.into_iter().map(EvolutionNode::from).collect(),
        }
    }
}

#[derive(Deserialize)]
struct PokedexResponse {
    pokemon_entries: Vec<PokedexEntry>,
}

#[derive(Deserialize)]
struct PokedexEntry {
    entry_number: u32,
    pokemon_species: NamedResource,
}

#[derive(Deserialize)]
struct ResourceListResponse {
    results: Vec<NamedResource>,
}

impl TryFrom<PokemonResponse> for Creature {
    type Error = DexError;

    fn try_from(p: PokemonResponse) -> Result<Self, Self::Error> {
        if p.id == 0 {
            return Err(DexError::Decode(format!("pokemon '{}' has id 0", p.name)));
        }
        let mut types = p.types;
        types.sort_by_key(|t| t.slot);

        Ok(Creature {
            id: p.id,
            name: p.name,
            types: types.into_iter().map(|t| t.kind.name).collect(),
            height: p.height,
            weight: p.weight,
            abilities: p.abilities.into_iter().map(|a| a.ability.name).collect(),
            sprite: p.sprites.front_default,
            species_url: p.species.url,
        })
    }
}

#[async_trait]
impl DexClient for PokeApiClient {
    #[instrument(skip(self))]
    async fn creature(&self, name_or_id: &str) -> Result<Creature, DexError> {
        if name_or_id.is_empty() {
            return Err(DexError::NotFound("pokemon/".into()));
        }
        let url = self.resource_url(&format!("pokemon/{name_or_id}"));
        let response: PokemonResponse = self.get_json(&url).await?;
        Creature::try_from(response)
    }

    #[instrument(skip(self))]
    async fn type_relations(&self, type_name: &str) -> Result<TypeDamageRelations, DexError> {
        let url = self.resource_url(&format!("type/{type_name}"));
        let response: TypeResponse = self.get_json(&url).await?;
        Ok(TypeDamageRelations {
            double_damage_from: response
                .damage_relations
                .double_damage_from
                .into_iter()
                .map(|t| t.name)
                .collect(),
        })
    }

    #[instrument(skip(self))]
    async fn species(&self, url: &str) -> Result<Species, DexError> {
        let response: SpeciesResponse = self.get_json(url).await?;
        let chain = response
            .evolution_chain
            .ok_or_else(|| DexError::Decode(format!("{url}: species has no evolution chain")))?;
        Ok(Species {
            generation: response.generation.name,
            evolution_chain_url: chain.url,
        })
    }

    #[instrument(skip(self))]
    async fn evolution_chain(&self, url: &str) -> Result<EvolutionNode, DexError> {
        let response: EvolutionChainResponse = self.get_json(url).await?;
        Ok(EvolutionNode::from(response.chain))
    }

    #[instrument(skip(self))]
    async fn national_dex(&self) -> Result<Vec<DexEntry>, DexError> {
        let url = self.resource_url("pokedex/national");
        let response: PokedexResponse = self.get_json(&url).await?;
        Ok(response
            .pokemon_entries
            .into_iter()
            .map(|e| DexEntry {
                entry_number: e.entry_number,
                name: e.pokemon_species.name,
                url: e.pokemon_species.url,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn creature_names(&self, limit: u32) -> Result<Vec<String>, DexError> {
        let url = self.resource_url(&format!("pokemon?limit={limit}"));
        let response: ResourceListResponse = self.get_json(&url).await?;
        Ok(response.results.into_iter().map(|r| r.name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokesearch_core::card::build_card;
    use pokesearch_core::evolution::DEFAULT_MAX_DEPTH;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PokeApiClient {
        PokeApiClient::new(Some(server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn pikachu_json(base: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 25,
            "name": "pikachu",
            "height": 4,
            "weight": 60,
            "sprites": {"front_default": "https://img.test/25.png"},
            "types": [{"slot": 1, "type": {"name": "electric", "url": format!("{base}/type/13/")}}],
            "abilities": [
                {"ability": {"name": "static", "url": ""}, "is_hidden": false, "slot": 1},
                {"ability": {"name": "lightning-rod", "url": ""}, "is_hidden": true, "slot": 3}
            ],
            "species": {"name": "pikachu", "url": format!("{base}/pokemon-species/25/")}
        })
    }

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetches_creature() {
        let server = MockServer::start().await;
        mount_json(&server, "/pokemon/pikachu", pikachu_json(&server.uri())).await;

        let creature = client(&server).creature("pikachu").await.unwrap();
        assert_eq!(creature.id, 25);
        assert_eq!(creature.types, vec!["electric"]);
        assert_eq!(creature.abilities, vec!["static", "lightning-rod"]);
        assert_eq!(creature.sprite.as_deref(), Some("https://img.test/25.png"));
        assert!(creature.species_url.ends_with("/pokemon-species/25/"));
    }

    #[tokio::test]
    async fn types_follow_slot_order() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "id": 6, "name": "charizard", "height": 17, "weight": 905,
            "sprites": {"front_default": null},
            "types": [
                {"slot": 2, "type": {"name": "flying", "url": ""}},
                {"slot": 1, "type": {"name": "fire", "url": ""}}
            ],
            "abilities": [],
            "species": {"url": "https://pokeapi.co/api/v2/pokemon-species/6/"}
        });
        mount_json(&server, "/pokemon/6", body).await;

        let creature = client(&server).creature("6").await.unwrap();
        assert_eq!(creature.types, vec!["fire", "flying"]);
        assert_eq!(creature.sprite, None);
    }

    #[tokio::test]
    async fn not_found_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/missingno"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client(&server).creature("missingno").await.unwrap_err();
        assert!(err.is_absent());
    }

    #[tokio::test]
    async fn server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).creature("pikachu").await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(
            err,
            DexError::Transport {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/pikachu"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).creature("pikachu").await.unwrap_err();
        assert!(matches!(err, DexError::Decode(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/slowpoke"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(pikachu_json(&server.uri()))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = PokeApiClient::new(Some(server.uri()), Duration::from_millis(200)).unwrap();
        let err = client.creature("slowpoke").await.unwrap_err();
        assert!(matches!(err, DexError::Timeout(_)));
    }

    #[tokio::test]
    async fn fetches_type_species_and_chain() {
        let server = MockServer::start().await;
        let base = server.uri();
        mount_json(
            &server,
            "/type/electric",
            serde_json::json!({
                "damage_relations": {
                    "double_damage_from": [{"name": "ground", "url": ""}],
                    "half_damage_from": []
                }
            }),
        )
        .await;
        mount_json(
            &server,
            "/pokemon-species/25/",
            serde_json::json!({
                "generation": {"name": "generation-i", "url": ""},
                "evolution_chain": {"url": format!("{base}/evolution-chain/10/")}
            }),
        )
        .await;
        mount_json(
            &server,
            "/evolution-chain/10/",
            serde_json::json!({
                "chain": {
                    "species": {"name": "pichu", "url": ""},
                    "evolves_to": [{
                        "species": {"name": "pikachu", "url": ""},
                        "evolves_to": [
                            {"species": {"name": "raichu", "url": ""}, "evolves_to": []}
                        ]
                    }]
                }
            }),
        )
        .await;

        let client = client(&server);
        let relations = client.type_relations("electric").await.unwrap();
        assert_eq!(relations.double_damage_from, vec!["ground"]);

        let species = client
            .species(&format!("{base}/pokemon-species/25/"))
            .await
            .unwrap();
        assert_eq!(species.generation, "generation-i");

        let root = client.evolution_chain(&species.evolution_chain_url).await.unwrap();
        assert_eq!(root.species, "pichu");
        assert_eq!(root.evolves_to[0].evolves_to[0].species, "raichu");
    }

    #[tokio::test]
    async fn fetches_national_dex_and_names() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/pokedex/national",
            serde_json::json!({
                "pokemon_entries": [
                    {"entry_number": 1, "pokemon_species": {"name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon-species/1/"}},
                    {"entry_number": 2, "pokemon_species": {"name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon-species/2/"}}
                ]
            }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/pokemon"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1302,
                "results": [
                    {"name": "bulbasaur", "url": ""},
                    {"name": "ivysaur", "url": ""},
                    {"name": "venusaur", "url": ""}
                ]
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let dex = client.national_dex().await.unwrap();
        assert_eq!(dex.len(), 2);
        assert_eq!(dex[1].name, "ivysaur");

        let names = client.creature_names(3).await.unwrap();
        assert_eq!(names, vec!["bulbasaur", "ivysaur", "venusaur"]);
    }

    #[tokio::test]
    async fn card_survives_missing_species() {
        let server = MockServer::start().await;
        mount_json(&server, "/pokemon/pikachu", pikachu_json(&server.uri())).await;
        mount_json(
            &server,
            "/type/electric",
            serde_json::json!({"damage_relations": {"double_damage_from": [{"name": "ground"}]}}),
        )
        .await;

        let card = build_card(&client(&server), "pikachu", DEFAULT_MAX_DEPTH)
            .await
            .unwrap();
        assert_eq!(card.weaknesses, vec!["ground"]);
        assert_eq!(card.generation, None);
        assert!(card.evolutions.is_empty());
    }

    #[test]
    fn default_base_url() {
        let client = PokeApiClient::new(None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);

        let client =
            PokeApiClient::new(Some("http://localhost:8080/api/v2/".into()), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/v2");
    }
}
