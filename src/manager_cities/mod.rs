pub mod errors;
pub mod models;
pub mod storage;

use log::{info, warn};
use crate::manager_cities::errors::CityError;
use crate::manager_cities::models::SavedCity;
use crate::manager_cities::storage::KeyValueStore;

pub const SAVED_CITIES_KEY: &str = "savedCities";
pub const DEFAULT_CITY_KEY: &str = "defaultCity";

/// The user's saved cities and the default among them, persisted in a key-value store
pub struct SavedCities<S: KeyValueStore> {
    store: S,
    cities: Vec<SavedCity>,
    default_city: Option<String>,
}

impl<S: KeyValueStore> SavedCities<S> {
    /// Loads saved cities from the store
    ///
    /// A default that no longer names a saved city is reassigned to the first saved city,
    /// or cleared when there are none.
    ///
    /// # Arguments
    ///
    /// * 'store' - storage holding the `savedCities` and `defaultCity` keys
    pub fn load(store: S) -> Result<Self, CityError> {
        let mut saved = SavedCities { store, cities: Vec::new(), default_city: None };
        saved.reload()?;

        Ok(saved)
    }

    pub fn cities(&self) -> &[SavedCity] {
        &self.cities
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_city.as_deref()
    }

    pub fn default_city(&self) -> Option<&SavedCity> {
        let name = self.default_city.as_deref()?;
        self.cities.iter().find(|c| c.is_named(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cities.iter().any(|c| c.is_named(name))
    }

    /// Adds a city, which becomes the default if it is the first one
    ///
    /// # Arguments
    ///
    /// * 'city' - the city to add, rejected if the name is already saved in any casing
    pub fn add(&mut self, city: SavedCity) -> Result<(), CityError> {
        self.reload()?;

        if self.contains(&city.name) {
            return Err(CityError::Duplicate(city.name));
        }

        info!("saving city {}", city.name);
        if self.cities.is_empty() {
            self.default_city = Some(city.name.clone());
        }
        self.cities.push(city);

        self.persist()
    }

    /// Removes a city and returns it, or `None` if no such city was saved
    ///
    /// Removing the default city hands the default to the first remaining city.
    ///
    /// # Arguments
    ///
    /// * 'name' - name of the city, in any casing
    pub fn remove(&mut self, name: &str) -> Result<Option<SavedCity>, CityError> {
        self.reload()?;

        let Some(index) = self.cities.iter().position(|c| c.is_named(name)) else {
            return Ok(None);
        };
        let removed = self.cities.remove(index);
        info!("removed saved city {}", removed.name);

        if self.default_city.as_deref().is_some_and(|d| removed.is_named(d)) {
            self.default_city = self.cities.first().map(|c| c.name.clone());
        }

        self.persist()?;

        Ok(Some(removed))
    }

    /// Makes a saved city the default
    ///
    /// # Arguments
    ///
    /// * 'name' - name of a saved city, in any casing
    pub fn set_default(&mut self, name: &str) -> Result<(), CityError> {
        self.reload()?;

        let city = self.cities
            .iter()
            .find(|c| c.is_named(name))
            .ok_or_else(|| CityError::Unknown(name.to_string()))?;
        self.default_city = Some(city.name.clone());

        self.persist()
    }

    fn reload(&mut self) -> Result<(), CityError> {
        self.cities = match self.store.get(SAVED_CITIES_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        self.default_city = self.store.get(DEFAULT_CITY_KEY)?.filter(|d| !d.is_empty());

        let dangling = self.default_city.as_deref().is_some_and(|d| !self.contains(d));
        if dangling || (self.default_city.is_none() && !self.cities.is_empty()) {
            if dangling {
                warn!("default city no longer saved, reassigning");
            }
            self.default_city = self.cities.first().map(|c| c.name.clone());
        }

        Ok(())
    }

    fn persist(&mut self) -> Result<(), CityError> {
        self.store.set(SAVED_CITIES_KEY, &serde_json::to_string(&self.cities)?)?;
        match &self.default_city {
            Some(name) => self.store.set(DEFAULT_CITY_KEY, name),
            None => self.store.remove(DEFAULT_CITY_KEY),
        }
    }
}
